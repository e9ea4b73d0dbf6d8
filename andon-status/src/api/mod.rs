//! JSON read API over the status board

pub mod health;
pub mod machines;
pub mod telemetry;

pub use health::health_routes;
pub use machines::machine_routes;
pub use telemetry::telemetry_routes;
