//! Telemetry file loading
//!
//! Each configured pattern is resolved against the content root. The
//! directory part must exist; the file-name part may use `*` and `?`. The
//! first matching file (by name) is read per pattern, and the items of every
//! file read are concatenated in pattern order.
//!
//! A pattern that cannot be read is skipped and remembered. The load only
//! fails when no pattern produced a file.

use andon_common::config::TelemetryConfig;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use super::document::{TelemetryDocument, TelemetryFile};

/// Telemetry load errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Every pattern failed; carries the per-pattern reasons
    #[error("No files were loaded successfully. Errors: {0}")]
    NothingLoaded(String),

    /// The blocking load task did not complete
    #[error("Telemetry load task failed: {0}")]
    Task(String),
}

/// Produces one merged telemetry document per call
#[async_trait]
pub trait TelemetryLoader: Send + Sync {
    async fn load(&self) -> Result<TelemetryDocument, TelemetryError>;
}

/// Reads telemetry JSON files from disk
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    content_root: PathBuf,
    patterns: Vec<String>,
}

impl JsonFileLoader {
    pub fn new(content_root: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            content_root: content_root.into(),
            patterns,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.content_root.clone(), config.file_patterns.clone())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Synchronous load; `load` runs this on the blocking pool
    pub fn load_blocking(&self) -> Result<TelemetryDocument, TelemetryError> {
        let mut items = Vec::new();
        let mut loaded_files = 0usize;
        let mut errors = Vec::new();

        for pattern in &self.patterns {
            match self.load_pattern(pattern) {
                Ok((path, file)) => {
                    debug!(
                        "Loaded {} items from {}",
                        file.items.len(),
                        file_name(&path)
                    );
                    items.extend(file.items);
                    loaded_files += 1;
                }
                Err(reason) => {
                    debug!("{}", reason);
                    errors.push(reason);
                }
            }
        }

        if loaded_files == 0 {
            let err = TelemetryError::NothingLoaded(errors.join(", "));
            warn!("{}", err);
            return Err(err);
        }

        debug!(
            "Loaded {} telemetry items from {} files",
            items.len(),
            loaded_files
        );
        Ok(TelemetryDocument::new(items))
    }

    /// Read the first file matching one pattern
    fn load_pattern(&self, pattern: &str) -> Result<(PathBuf, TelemetryFile), String> {
        let full = self.content_root.join(pattern);
        let directory = match full.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.content_root.clone(),
        };
        let file_pattern = full
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format!("Invalid file pattern: {}", pattern))?;

        if !directory.is_dir() {
            return Err(format!("Directory not found: {}", directory.display()));
        }

        let matcher = wildcard_regex(file_pattern)
            .map_err(|e| format!("Invalid file pattern {}: {}", pattern, e))?;

        // Collectors often point a stable name at the newest file
        let path = WalkDir::new(&directory)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| matcher.is_match(name))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .ok_or_else(|| format!("No files found for pattern: {}", pattern))?;

        let bytes = std::fs::read(&path).map_err(|e| {
            error!("Failed to read telemetry file {}: {}", path.display(), e);
            format!("File I/O error in {}: {}", file_name(&path), e)
        })?;

        let file = TelemetryFile::from_slice(&bytes).map_err(|e| {
            error!("Failed to parse telemetry file {}: {}", path.display(), e);
            format!("JSON parsing error in {}: {}", file_name(&path), e)
        })?;

        Ok((path, file))
    }
}

#[async_trait]
impl TelemetryLoader for JsonFileLoader {
    async fn load(&self) -> Result<TelemetryDocument, TelemetryError> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.load_blocking())
            .await
            .map_err(|e| TelemetryError::Task(e.to_string()))?
    }
}

/// Anchored regex for a `*` / `?` file-name wildcard
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{}$", escaped))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
