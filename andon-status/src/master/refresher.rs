//! Periodic master table reload
//!
//! The first refresh happens at startup and is best-effort like every later
//! one: a failure is logged and the previous tables stay published.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::cache::MasterLookupCache;
use crate::periodic::run_periodic;

pub struct MasterRefresher {
    cache: Arc<MasterLookupCache>,
    interval: Duration,
}

impl MasterRefresher {
    pub fn new(cache: Arc<MasterLookupCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Refresh once, logging instead of returning the error
    pub async fn refresh_once(&self) {
        let initial = self.cache.snapshot().loaded_at().is_none();
        match self.cache.refresh().await {
            Ok(_) if initial => info!("Initial master data load complete"),
            Ok(_) => info!("Periodic master data refresh complete"),
            Err(e) if initial => error!("Initial master data load failed: {}", e),
            Err(e) => error!("Periodic master data refresh failed: {}", e),
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let this = &self;
        run_periodic("Master refresher", self.interval, cancel, || {
            this.refresh_once()
        })
        .await;
    }
}
