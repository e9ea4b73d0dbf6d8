//! Shared fixtures for andon-status integration tests
#![allow(dead_code)]

pub mod sqlite;

use andon_common::{Error, Result};
use andon_status::models::{MachineId, MachineStatusRow, MasterEntry, MasterNamespace};
use andon_status::source::{MasterSource, StatusSource};
use andon_status::telemetry::{
    DeviceAddress, TelemetryDocument, TelemetryError, TelemetryItem, TelemetryLoader,
    TelemetryValue,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Status source serving a fixed set of rows
pub struct StaticStatusSource {
    rows: Vec<MachineStatusRow>,
}

impl StaticStatusSource {
    pub fn new(mut rows: Vec<MachineStatusRow>) -> Self {
        rows.sort_by_key(|row| row.machine_id);
        Self { rows }
    }
}

#[async_trait]
impl StatusSource for StaticStatusSource {
    async fn fetch_all(&self) -> Result<Vec<MachineStatusRow>> {
        Ok(self.rows.clone())
    }

    async fn fetch_one(&self, machine_id: MachineId) -> Result<Option<MachineStatusRow>> {
        Ok(self.rows.iter().find(|row| row.machine_id == machine_id).cloned())
    }
}

/// Status source whose every query fails
pub struct FailingStatusSource;

#[async_trait]
impl StatusSource for FailingStatusSource {
    async fn fetch_all(&self) -> Result<Vec<MachineStatusRow>> {
        Err(Error::Internal("linked server unreachable".to_string()))
    }

    async fn fetch_one(&self, _machine_id: MachineId) -> Result<Option<MachineStatusRow>> {
        Err(Error::Internal("linked server unreachable".to_string()))
    }
}

/// Master source with editable tables and an optional failing namespace
#[derive(Default)]
pub struct StaticMasterSource {
    errors: Mutex<Vec<MasterEntry>>,
    waits: Mutex<Vec<MasterEntry>>,
    stops: Mutex<Vec<MasterEntry>>,
    fail: Mutex<Option<MasterNamespace>>,
    calls: AtomicUsize,
}

impl StaticMasterSource {
    pub fn new(errors: Vec<MasterEntry>, waits: Vec<MasterEntry>, stops: Vec<MasterEntry>) -> Self {
        Self {
            errors: Mutex::new(errors),
            waits: Mutex::new(waits),
            stops: Mutex::new(stops),
            ..Default::default()
        }
    }

    pub fn set(&self, namespace: MasterNamespace, entries: Vec<MasterEntry>) {
        *self.table(namespace).lock().unwrap() = entries;
    }

    pub fn fail_on(&self, namespace: Option<MasterNamespace>) {
        *self.fail.lock().unwrap() = namespace;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn table(&self, namespace: MasterNamespace) -> &Mutex<Vec<MasterEntry>> {
        match namespace {
            MasterNamespace::Error => &self.errors,
            MasterNamespace::Wait => &self.waits,
            MasterNamespace::Stop => &self.stops,
        }
    }
}

#[async_trait]
impl MasterSource for StaticMasterSource {
    async fn fetch_names(&self, namespace: MasterNamespace) -> Result<Vec<MasterEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() == Some(namespace) {
            return Err(Error::Internal(format!("{} master query failed", namespace.as_str())));
        }
        Ok(self.table(namespace).lock().unwrap().clone())
    }
}

/// Telemetry loader returning a preset outcome
pub struct StaticLoader {
    outcome: Mutex<std::result::Result<Vec<TelemetryItem>, String>>,
}

impl StaticLoader {
    pub fn ok(items: Vec<TelemetryItem>) -> Self {
        Self {
            outcome: Mutex::new(Ok(items)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Mutex::new(Err(reason.to_string())),
        }
    }
}

#[async_trait]
impl TelemetryLoader for StaticLoader {
    async fn load(&self) -> std::result::Result<TelemetryDocument, TelemetryError> {
        match &*self.outcome.lock().unwrap() {
            Ok(items) => Ok(TelemetryDocument::new(items.clone())),
            Err(reason) => Err(TelemetryError::NothingLoaded(reason.clone())),
        }
    }
}

/// Bit device reading, e.g. `bit("X", "1BA", 1)`
pub fn bit(code: &str, number: &str, value: i64) -> TelemetryItem {
    TelemetryItem {
        device: DeviceAddress {
            code: code.to_string(),
            number: number.to_string(),
        },
        digits: 1,
        unit: "bit".to_string(),
        value: TelemetryValue::Integer(value),
    }
}

pub fn document(items: Vec<TelemetryItem>) -> TelemetryDocument {
    TelemetryDocument::new(items)
}
