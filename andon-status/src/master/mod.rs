//! Master (code → name) lookup tables and their refresher

pub mod cache;
pub mod refresher;

pub use cache::{MasterCounts, MasterLookupCache, MasterTables};
pub use refresher::MasterRefresher;
