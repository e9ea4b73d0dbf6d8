//! Status aggregation
//!
//! Joins the status source rows with the master names and the material alarm
//! telemetry into display records. Source failures never reach the caller:
//! `list_all` degrades to an empty list and `get` to `None`, and both log.
//!
//! Each pass reads one master generation and one telemetry document up front,
//! so every row in a pass is resolved against the same data.

use andon_common::config::StatusLabels;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::alarm::{MaterialAlarmState, MaterialAlarmTable};
use super::message::{build_status_message, ResolvedNames};
use crate::master::{MasterLookupCache, MasterTables};
use crate::models::{Code, MachineId, MachineStatusDisplay, MachineStatusRow, MasterNamespace};
use crate::source::StatusSource;
use crate::telemetry::{TelemetryDocument, TelemetrySnapshot};

pub struct StatusAggregator {
    source: Arc<dyn StatusSource>,
    masters: Arc<MasterLookupCache>,
    telemetry: Arc<TelemetrySnapshot>,
    alarms: Arc<MaterialAlarmTable>,
    labels: StatusLabels,
}

impl StatusAggregator {
    pub fn new(
        source: Arc<dyn StatusSource>,
        masters: Arc<MasterLookupCache>,
        telemetry: Arc<TelemetrySnapshot>,
        alarms: Arc<MaterialAlarmTable>,
        labels: StatusLabels,
    ) -> Self {
        Self {
            source,
            masters,
            telemetry,
            alarms,
            labels,
        }
    }

    /// Every machine's display record, ordered by machine id
    pub async fn list_all(&self) -> Vec<MachineStatusDisplay> {
        let rows = match self.source.fetch_all().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Status query failed: {}", e);
                return Vec::new();
            }
        };

        let tables = self.masters.snapshot();
        let document = self.telemetry.current().await;

        rows.iter()
            .map(|row| self.build(row, &tables, document.as_deref()))
            .collect()
    }

    /// One machine's display record
    pub async fn get(&self, machine_id: MachineId) -> Option<MachineStatusDisplay> {
        let row = match self.source.fetch_one(machine_id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!("No status row for machine {}", machine_id);
                return None;
            }
            Err(e) => {
                error!("Status query for machine {} failed: {}", machine_id, e);
                return None;
            }
        };

        let tables = self.masters.snapshot();
        let document = self.telemetry.current().await;
        Some(self.build(&row, &tables, document.as_deref()))
    }

    fn build(
        &self,
        row: &MachineStatusRow,
        tables: &MasterTables,
        document: Option<&TelemetryDocument>,
    ) -> MachineStatusDisplay {
        let names = resolve_names(row, tables);
        let alarm = self.material_alarm(row.machine_id, document);
        let status_message = build_status_message(row, &names, &alarm, &self.labels);

        MachineStatusDisplay {
            machine_id: row.machine_id,
            produced_count: row.produced_count,
            status_message,
            ready: row.ready,
            running: row.running,
            waiting: row.waiting,
            stopped: row.stopped,
            errored: row.errored,
            error_name: names.error,
            wait_name: names.wait,
            stop_name: names.stop,
            material_alarm: alarm.active,
            material_alarm_name: alarm.label,
        }
    }

    fn material_alarm(
        &self,
        machine_id: MachineId,
        document: Option<&TelemetryDocument>,
    ) -> MaterialAlarmState {
        let Some(rule) = self.alarms.rule(machine_id) else {
            return MaterialAlarmState::default();
        };
        let value = document.and_then(|doc| doc.value(&rule.device));
        if value.is_none() {
            debug!(
                "No telemetry value for {} (machine {})",
                rule.device, machine_id
            );
        }
        MaterialAlarmState::evaluate(rule, value)
    }
}

fn resolve_names(row: &MachineStatusRow, tables: &MasterTables) -> ResolvedNames {
    let machine_id = row.machine_id;
    let error = active_code(row.errored, row.error_code)
        .and_then(|code| lookup_logged(tables, MasterNamespace::Error, machine_id, code));
    let wait = active_code(row.waiting, row.wait_code)
        .and_then(|code| lookup_logged(tables, MasterNamespace::Wait, machine_id, code));
    // No dedicated stop code column yet; the stop master is keyed by the error code
    let stop = active_code(row.stopped, row.error_code)
        .and_then(|code| lookup(tables, MasterNamespace::Stop, machine_id, code));

    ResolvedNames { error, wait, stop }
}

/// The code when its flag is set and the code is present and nonzero
fn active_code(flag: Option<bool>, code: Option<Code>) -> Option<Code> {
    match (flag, code) {
        (Some(true), Some(code)) if code != 0 => Some(code),
        _ => None,
    }
}

fn lookup(
    tables: &MasterTables,
    namespace: MasterNamespace,
    machine_id: MachineId,
    code: Code,
) -> Option<String> {
    tables
        .lookup(namespace, machine_id, code)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn lookup_logged(
    tables: &MasterTables,
    namespace: MasterNamespace,
    machine_id: MachineId,
    code: Code,
) -> Option<String> {
    let name = lookup(tables, namespace, machine_id, code);
    match &name {
        Some(name) => debug!(
            "{} name for machine {} code {}: {}",
            namespace.as_str(),
            machine_id,
            code,
            name
        ),
        None => warn!(
            "No {} name for machine {} code {}",
            namespace.as_str(),
            machine_id,
            code
        ),
    }
    name
}
