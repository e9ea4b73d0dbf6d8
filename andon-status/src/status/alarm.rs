//! Material alarm rules
//!
//! A machine may be mapped to one telemetry device. The alarm is raised only
//! while that device reads exactly 1. The table is built once from
//! configuration and never changes afterwards.

use andon_common::config::MaterialAlarmConfig;
use std::collections::HashMap;

use crate::models::MachineId;

/// Device and label for one machine's material alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialAlarmRule {
    pub device: String,
    pub label: String,
}

/// Result of evaluating a rule against the current telemetry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialAlarmState {
    pub active: bool,
    /// Rule label, only while active
    pub label: Option<String>,
}

impl MaterialAlarmState {
    pub fn evaluate(rule: &MaterialAlarmRule, value: Option<i64>) -> Self {
        if value == Some(1) {
            Self {
                active: true,
                label: Some(rule.label.clone()).filter(|label| !label.is_empty()),
            }
        } else {
            Self::default()
        }
    }
}

/// Machine → material alarm rule
#[derive(Debug, Clone, Default)]
pub struct MaterialAlarmTable {
    rules: HashMap<MachineId, MaterialAlarmRule>,
}

impl MaterialAlarmTable {
    pub fn new(rules: impl IntoIterator<Item = (MachineId, MaterialAlarmRule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn from_config(entries: &[MaterialAlarmConfig]) -> Self {
        Self::new(entries.iter().map(|entry| {
            (
                entry.machine_id,
                MaterialAlarmRule {
                    device: entry.device.clone(),
                    label: entry.label.clone(),
                },
            )
        }))
    }

    pub fn rule(&self, machine_id: MachineId) -> Option<&MaterialAlarmRule> {
        self.rules.get(&machine_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
