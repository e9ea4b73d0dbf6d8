//! Master lookup cache
//!
//! The error, wait and stop name maps are published together as one
//! `MasterTables` value behind an `ArcSwap`. A refresh builds all three maps
//! first and swaps only when every query succeeded, so readers see either the
//! previous set or the new set, never a mix. Readers never take a lock;
//! refreshes are serialized by a mutex that only refreshes contend on.

use andon_common::time::{Clock, SystemClock};
use andon_common::Result;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{Code, MachineId, MasterEntry, MasterNamespace};
use crate::source::MasterSource;

/// (machine, code) → display name; `None` when the source row had no name
pub type NameMap = HashMap<(MachineId, Code), Option<String>>;

/// Entry count per namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MasterCounts {
    pub errors: usize,
    pub waits: usize,
    pub stops: usize,
}

/// One consistent generation of the three master maps
#[derive(Debug, Clone, Default)]
pub struct MasterTables {
    errors: NameMap,
    waits: NameMap,
    stops: NameMap,
    loaded_at: Option<DateTime<Utc>>,
}

impl MasterTables {
    pub fn new(
        errors: Vec<MasterEntry>,
        waits: Vec<MasterEntry>,
        stops: Vec<MasterEntry>,
        loaded_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            errors: to_map(errors),
            waits: to_map(waits),
            stops: to_map(stops),
            loaded_at,
        }
    }

    pub fn lookup(&self, namespace: MasterNamespace, machine_id: MachineId, code: Code) -> Option<&str> {
        self.map(namespace)
            .get(&(machine_id, code))
            .and_then(|name| name.as_deref())
    }

    pub fn counts(&self) -> MasterCounts {
        MasterCounts {
            errors: self.errors.len(),
            waits: self.waits.len(),
            stops: self.stops.len(),
        }
    }

    /// When this generation was published; `None` before the first refresh
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    fn map(&self, namespace: MasterNamespace) -> &NameMap {
        match namespace {
            MasterNamespace::Error => &self.errors,
            MasterNamespace::Wait => &self.waits,
            MasterNamespace::Stop => &self.stops,
        }
    }
}

fn to_map(entries: Vec<MasterEntry>) -> NameMap {
    entries
        .into_iter()
        .map(|entry| ((entry.machine_id, entry.code), entry.name))
        .collect()
}

/// Cache of the three code → name master tables
pub struct MasterLookupCache {
    source: Arc<dyn MasterSource>,
    tables: ArcSwap<MasterTables>,
    refresh_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl MasterLookupCache {
    pub fn new(source: Arc<dyn MasterSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn MasterSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            tables: ArcSwap::from_pointee(MasterTables::default()),
            refresh_lock: Mutex::new(()),
            clock,
        }
    }

    /// Reload all three tables and publish them together
    ///
    /// Any failing query aborts the refresh with the previous generation left
    /// in place, and the error is returned to the caller.
    pub async fn refresh(&self) -> Result<MasterCounts> {
        let _guard = self.refresh_lock.lock().await;

        let errors = self.fetch(MasterNamespace::Error).await?;
        let waits = self.fetch(MasterNamespace::Wait).await?;
        let stops = self.fetch(MasterNamespace::Stop).await?;
        let tables = MasterTables::new(errors, waits, stops, Some(self.clock.now()));
        let counts = tables.counts();

        self.tables.store(Arc::new(tables));

        info!(
            "Master data updated (ERR: {}, WAIT: {}, STOP: {})",
            counts.errors, counts.waits, counts.stops
        );
        Ok(counts)
    }

    async fn fetch(&self, namespace: MasterNamespace) -> Result<Vec<MasterEntry>> {
        debug!("Loading {} master", namespace.as_str());
        let entries = self.source.fetch_names(namespace).await?;
        debug!("{} master read: {} entries", namespace.as_str(), entries.len());
        Ok(entries)
    }

    /// Name for a code in the currently published tables
    pub fn lookup(&self, namespace: MasterNamespace, machine_id: MachineId, code: Code) -> Option<String> {
        self.tables
            .load()
            .lookup(namespace, machine_id, code)
            .map(str::to_string)
    }

    /// The currently published generation, for a consistent multi-lookup pass
    pub fn snapshot(&self) -> Arc<MasterTables> {
        self.tables.load_full()
    }

    pub fn counts(&self) -> MasterCounts {
        self.tables.load().counts()
    }
}
