//! Display message synthesis
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. every state flag clear: error name, else the error label
//! 2. errored: error name, else the error label
//! 3. stopped: the stopped label
//! 4. material alarm: alarm label, else the material alarm label
//! 5. arranging: the setup label
//! 6. waiting: wait name, else the waiting label
//! 7. running: the running label
//! 8. ready: the ready label
//! 9. otherwise the placeholder
//!
//! An all-clear row is treated as an error, not as idle.

use andon_common::config::StatusLabels;

use super::alarm::MaterialAlarmState;
use crate::models::MachineStatusRow;

/// Master names resolved for one row; empty names are stored as `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    pub error: Option<String>,
    pub wait: Option<String>,
    pub stop: Option<String>,
}

fn is_set(flag: Option<bool>) -> bool {
    flag == Some(true)
}

fn name_or<'a>(name: Option<&'a String>, label: &'a str) -> &'a str {
    name.map(String::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(label)
}

pub fn build_status_message(
    row: &MachineStatusRow,
    names: &ResolvedNames,
    alarm: &MaterialAlarmState,
    labels: &StatusLabels,
) -> String {
    let message: &str = if row.all_flags_clear() || is_set(row.errored) {
        name_or(names.error.as_ref(), &labels.error)
    } else if is_set(row.stopped) {
        &labels.stopped
    } else if alarm.active {
        name_or(alarm.label.as_ref(), &labels.material_alarm)
    } else if is_set(row.arranging) {
        &labels.arranging
    } else if is_set(row.waiting) {
        name_or(names.wait.as_ref(), &labels.waiting)
    } else if is_set(row.running) {
        &labels.running
    } else if is_set(row.ready) {
        &labels.ready
    } else {
        &labels.placeholder
    };
    message.to_string()
}
