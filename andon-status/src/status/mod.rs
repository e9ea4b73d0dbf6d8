//! Status aggregation: master names, material alarms and the display message

pub mod aggregator;
pub mod alarm;
pub mod message;

pub use aggregator::StatusAggregator;
pub use alarm::{MaterialAlarmRule, MaterialAlarmState, MaterialAlarmTable};
pub use message::{build_status_message, ResolvedNames};
