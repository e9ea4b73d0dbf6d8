//! Database connection and source-qualifier helpers

use crate::config::SourceConfig;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

/// Open the connection pool for the status source
///
/// The board only reads, so the pool is kept small.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    // Set busy timeout so reads wait out the writer instead of failing
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    info!("Connected to status source");
    Ok(pool)
}

/// Optional `[server].[database].[schema]` prefix for table references
///
/// Absent segments are skipped, so an unqualified source renders table names
/// bare and a schema-only source renders `[schema].[TABLE]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQualifier {
    segments: Vec<String>,
}

impl SourceQualifier {
    pub fn new(linked_server: Option<&str>, database: Option<&str>, schema: Option<&str>) -> Self {
        let segments = [linked_server, database, schema]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(
            config.linked_server.as_deref(),
            config.database.as_deref(),
            config.schema.as_deref(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fully qualified, bracket-quoted table reference
    pub fn table(&self, name: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('[');
            out.push_str(segment);
            out.push_str("].");
        }
        out.push('[');
        out.push_str(name);
        out.push(']');
        out
    }
}

impl std::fmt::Display for SourceQualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quoted: Vec<String> = self.segments.iter().map(|s| format!("[{}]", s)).collect();
        write!(f, "{}", quoted.join("."))
    }
}
