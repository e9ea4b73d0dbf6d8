//! Published telemetry snapshot
//!
//! The document handle and its refresh metadata (last success, consecutive
//! failures, last error) are one unit behind a single lock. Readers clone the
//! `Arc` to the document and release the lock before looking anything up, so
//! a later publish never changes what an in-flight reader sees.

use andon_common::time::Clock;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::document::TelemetryDocument;
use super::loader::TelemetryError;

#[derive(Debug, Default)]
struct SnapshotState {
    document: Option<Arc<TelemetryDocument>>,
    last_success: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

/// Point-in-time view of the refresh metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryStatus {
    /// Last successful load is within the staleness window
    pub connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub item_count: usize,
}

/// Most recently loaded telemetry, kept through failed loads
#[derive(Debug)]
pub struct TelemetrySnapshot {
    state: RwLock<SnapshotState>,
    staleness: Duration,
    clock: Arc<dyn Clock>,
}

impl TelemetrySnapshot {
    pub fn new(staleness: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(SnapshotState::default()),
            staleness,
            clock,
        }
    }

    /// Apply the outcome of one refresh cycle
    ///
    /// Success replaces the document and clears the failure state. Failure
    /// keeps the previous document, bumps the failure counter and records the
    /// error.
    pub async fn update(&self, outcome: Result<TelemetryDocument, TelemetryError>) {
        let now = self.clock.now();
        let mut state = self.state.write().await;

        match outcome {
            Ok(document) => {
                debug!("Telemetry snapshot updated. Items: {}", document.len());
                state.document = Some(Arc::new(document));
                state.last_success = Some(now);
                state.consecutive_failures = 0;
                state.last_error = None;
            }
            Err(err) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                state.last_error = Some(err.to_string());
                warn!(
                    "Telemetry snapshot update failed ({} consecutive). Error: {}",
                    state.consecutive_failures, err
                );
            }
        }
    }

    /// Currently published document, if any load has succeeded
    pub async fn current(&self) -> Option<Arc<TelemetryDocument>> {
        self.state.read().await.document.clone()
    }

    /// Integer value of a device in the published document
    pub async fn get_value(&self, device_id: &str) -> Option<i64> {
        let document = self.current().await?;
        let value = document.value(device_id);
        if value.is_none() && document.item(device_id).is_some() {
            debug!("Telemetry value for {} is not an integer", device_id);
        }
        value
    }

    /// Recomputed from the clock on every call
    pub async fn is_fresh(&self) -> bool {
        let last_success = self.state.read().await.last_success;
        self.fresh_since(last_success)
    }

    pub async fn status(&self) -> TelemetryStatus {
        let state = self.state.read().await;
        TelemetryStatus {
            connected: self.fresh_since(state.last_success),
            last_update: state.last_success,
            consecutive_failures: state.consecutive_failures,
            last_error: state.last_error.clone(),
            item_count: state.document.as_ref().map(|d| d.len()).unwrap_or(0),
        }
    }

    fn fresh_since(&self, last_success: Option<DateTime<Utc>>) -> bool {
        let Some(last_success) = last_success else {
            return false;
        };
        match (self.clock.now() - last_success).to_std() {
            Ok(age) => age <= self.staleness,
            // Clock stepped backwards past the last success
            Err(_) => true,
        }
    }
}
