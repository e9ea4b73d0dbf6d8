//! Device telemetry: file loading, the published snapshot and its refresher

pub mod document;
pub mod loader;
pub mod refresher;
pub mod snapshot;

pub use document::{DeviceAddress, TelemetryDocument, TelemetryItem, TelemetryValue};
pub use loader::{JsonFileLoader, TelemetryError, TelemetryLoader};
pub use refresher::TelemetryRefresher;
pub use snapshot::{TelemetrySnapshot, TelemetryStatus};
