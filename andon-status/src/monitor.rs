//! Status monitor loop
//!
//! Runs the aggregation on a fixed interval so source and master problems
//! show up in the logs even when nobody is reading the board. The results are
//! dropped after logging.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::periodic::run_periodic;
use crate::status::StatusAggregator;

pub struct StatusMonitor {
    aggregator: Arc<StatusAggregator>,
    interval: Duration,
}

impl StatusMonitor {
    pub fn new(aggregator: Arc<StatusAggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
        }
    }

    /// One aggregation pass; returns the number of machines seen
    pub async fn check_once(&self) -> usize {
        let machines = self.aggregator.list_all().await;
        if machines.is_empty() {
            warn!("Status monitor: no machines reported");
        } else {
            debug!("Status monitor: {} machines", machines.len());
        }
        machines.len()
    }

    pub async fn run(self, cancel: CancellationToken) {
        let this = &self;
        run_periodic("Status monitor", self.interval, cancel, || async move {
            this.check_once().await;
        })
        .await;
    }
}
