//! # Andon Common Library
//!
//! Shared code for the andon status-board services:
//! - Error type and result alias
//! - TOML bootstrap configuration and its resolution
//! - Database connection and source-qualifier helpers
//! - Clock abstraction used by staleness checks

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
