//! Periodic telemetry reload
//!
//! Loads on its own task and only takes the snapshot lock to install the
//! result.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::loader::TelemetryLoader;
use super::snapshot::TelemetrySnapshot;
use crate::periodic::run_periodic;

pub struct TelemetryRefresher {
    loader: Arc<dyn TelemetryLoader>,
    snapshot: Arc<TelemetrySnapshot>,
    interval: Duration,
}

impl TelemetryRefresher {
    pub fn new(
        loader: Arc<dyn TelemetryLoader>,
        snapshot: Arc<TelemetrySnapshot>,
        interval: Duration,
    ) -> Self {
        Self {
            loader,
            snapshot,
            interval,
        }
    }

    /// Load once and publish the outcome
    pub async fn refresh_once(&self) {
        let outcome = self.loader.load().await;
        self.snapshot.update(outcome).await;
    }

    /// Refresh immediately, then on every tick until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        let this = &self;
        run_periodic("Telemetry refresher", self.interval, cancel, || {
            this.refresh_once()
        })
        .await;
    }
}
