//! Status board data model
//!
//! `MachineStatusRow` is what the status source reports per machine,
//! `MasterEntry` is one row of a code → name master table, and
//! `MachineStatusDisplay` is the merged record handed to readers.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Machine number, 1..N, unique within one status read
pub type MachineId = u8;

/// Error / wait / stop code as stored in the source
pub type Code = i16;

/// One machine's raw status as read from the status source
///
/// All flags and codes may be absent at once; an all-absent row is a valid
/// state that the board reports as an anomaly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineStatusRow {
    pub machine_id: MachineId,
    pub model_no: Option<i16>,
    pub ready: Option<bool>,
    pub running: Option<bool>,
    pub waiting: Option<bool>,
    pub wait_code: Option<Code>,
    pub arranging: Option<bool>,
    pub stopped: Option<bool>,
    pub errored: Option<bool>,
    pub error_code: Option<Code>,
    pub into_sum: Option<i32>,
    pub produced_sum: Option<i32>,
    pub target_count: Option<i32>,
    pub into_count: Option<i32>,
    pub produced_count: Option<i32>,
    pub out_count: Option<i32>,
    pub updated_at: Option<NaiveDateTime>,
    pub note: Option<String>,
    pub lot_number: Option<String>,
    pub model_name: Option<String>,
    pub product_class: Option<String>,
    pub coil_number: Option<i64>,
}

impl MachineStatusRow {
    /// Row with only the machine id set; every flag absent
    pub fn new(machine_id: MachineId) -> Self {
        Self {
            machine_id,
            ..Default::default()
        }
    }

    /// True when none of the six state flags is set
    pub fn all_flags_clear(&self) -> bool {
        [
            self.ready,
            self.running,
            self.waiting,
            self.arranging,
            self.stopped,
            self.errored,
        ]
        .iter()
        .all(|flag| *flag != Some(true))
    }
}

/// Master table a name is resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterNamespace {
    Error,
    Wait,
    Stop,
}

impl MasterNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            MasterNamespace::Error => "error",
            MasterNamespace::Wait => "wait",
            MasterNamespace::Stop => "stop",
        }
    }
}

/// One enabled row of a master table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterEntry {
    pub machine_id: MachineId,
    pub code: Code,
    /// `None` when the source row has no name; looked up as "no name"
    pub name: Option<String>,
}

impl MasterEntry {
    pub fn new(machine_id: MachineId, code: Code, name: impl Into<String>) -> Self {
        Self {
            machine_id,
            code,
            name: Some(name.into()),
        }
    }
}

/// Per-machine record shown on the board
///
/// Built fresh on every aggregation pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineStatusDisplay {
    pub machine_id: MachineId,
    pub produced_count: Option<i32>,
    pub status_message: String,
    pub ready: Option<bool>,
    pub running: Option<bool>,
    pub waiting: Option<bool>,
    pub stopped: Option<bool>,
    pub errored: Option<bool>,
    pub error_name: Option<String>,
    pub wait_name: Option<String>,
    pub stop_name: Option<String>,
    pub material_alarm: bool,
    pub material_alarm_name: Option<String>,
}
