//! andon-status library interface
//!
//! Status board backend: the telemetry snapshot and master lookup caches,
//! their refresh loops, the status aggregator and a JSON read API. `main.rs`
//! only parses arguments and wires a [`StatusBoard`] to its sources.

pub mod api;
pub mod error;
pub mod master;
pub mod models;
pub mod monitor;
pub mod periodic;
pub mod source;
pub mod status;
pub mod telemetry;

pub use crate::error::{ApiError, ApiResult};

use andon_common::config::TomlConfig;
use andon_common::time::Clock;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::master::{MasterLookupCache, MasterRefresher};
use crate::monitor::StatusMonitor;
use crate::source::{MasterSource, StatusSource};
use crate::status::{MaterialAlarmTable, StatusAggregator};
use crate::telemetry::{TelemetryLoader, TelemetryRefresher, TelemetrySnapshot};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<StatusAggregator>,
    pub telemetry: Arc<TelemetrySnapshot>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(aggregator: Arc<StatusAggregator>, telemetry: Arc<TelemetrySnapshot>) -> Self {
        Self {
            aggregator,
            telemetry,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::machine_routes())
        .merge(api::telemetry_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Background loop periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopIntervals {
    pub telemetry: Duration,
    pub master: Duration,
    pub monitor: Duration,
}

impl LoopIntervals {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            telemetry: config.telemetry.refresh_interval(),
            master: config.master.refresh_interval(),
            monitor: config.monitor.interval(),
        }
    }
}

/// Explicitly wired status board: the shared caches, the aggregator over
/// them, and what the background loops need to keep them current
pub struct StatusBoard {
    pub aggregator: Arc<StatusAggregator>,
    pub telemetry: Arc<TelemetrySnapshot>,
    pub masters: Arc<MasterLookupCache>,
    loader: Arc<dyn TelemetryLoader>,
    intervals: LoopIntervals,
}

impl StatusBoard {
    pub fn new(
        config: &TomlConfig,
        status_source: Arc<dyn StatusSource>,
        master_source: Arc<dyn MasterSource>,
        loader: Arc<dyn TelemetryLoader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let telemetry = Arc::new(TelemetrySnapshot::new(
            config.telemetry.staleness_window(),
            clock.clone(),
        ));
        let masters = Arc::new(MasterLookupCache::with_clock(master_source, clock));
        let alarms = Arc::new(MaterialAlarmTable::from_config(&config.material_alarms));
        info!("Material alarm rules: {}", alarms.len());

        let aggregator = Arc::new(StatusAggregator::new(
            status_source,
            masters.clone(),
            telemetry.clone(),
            alarms,
            config.labels.clone(),
        ));

        Self {
            aggregator,
            telemetry,
            masters,
            loader,
            intervals: LoopIntervals::from_config(config),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.aggregator.clone(), self.telemetry.clone())
    }

    /// Start the telemetry refresher, the master refresher and the status
    /// monitor; each runs until `cancel` fires
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        let telemetry = TelemetryRefresher::new(
            self.loader.clone(),
            self.telemetry.clone(),
            self.intervals.telemetry,
        );
        let master = MasterRefresher::new(self.masters.clone(), self.intervals.master);
        let monitor = StatusMonitor::new(self.aggregator.clone(), self.intervals.monitor);

        vec![
            tokio::spawn(telemetry.run(cancel.child_token())),
            tokio::spawn(master.run(cancel.child_token())),
            tokio::spawn(monitor.run(cancel.child_token())),
        ]
    }
}
