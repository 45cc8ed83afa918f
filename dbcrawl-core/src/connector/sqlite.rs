//! SQLite connector.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db`, `sqlite://./relative.db`
//!   or a bare path ending in `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`

use super::sqlx_connection::SqlxConnection;
use super::{ConnectionOptions, DatabaseConnection, DatabaseConnector};
use crate::error::{CrawlError, Result};
use crate::retrieval::RetrievalOptionsBuilder;
use async_trait::async_trait;
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use std::str::FromStr;
use tracing::debug;

/// SQLite through `sqlx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

#[async_trait]
impl DatabaseConnector for SqliteConnector {
    fn server_type(&self) -> &'static str {
        "sqlite"
    }

    fn description(&self) -> &'static str {
        "SQLite"
    }

    fn supports_url(&self, url: &str) -> bool {
        url.starts_with("sqlite:")
            || url == ":memory:"
            || url.ends_with(".db")
            || url.ends_with(".sqlite")
            || url.ends_with(".sqlite3")
    }

    fn bundled_toml(&self) -> &'static str {
        include_str!("../../bundled/sqlite.toml")
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn DatabaseConnection>> {
        let normalized = normalize_connection_string(options.url());
        let connect_options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
            CrawlError::connection_failed(
                format!("Invalid SQLite connection string {}", options.redacted_url()),
                e,
            )
        })?;

        debug!("Opening SQLite database {}", options.redacted_url());
        let connection = SqliteConnection::connect_with(&connect_options)
            .await
            .map_err(|e| CrawlError::connection_failed("Failed to open SQLite database", e))?;
        Ok(Box::new(SqlxConnection::new(self.server_type(), connection)))
    }

    /// SQLite has neither catalogs nor schemas beyond `main`.
    fn retrieval_options_builder(&self) -> RetrievalOptionsBuilder {
        RetrievalOptionsBuilder::new(self.server_type())
            .supports_catalogs(false)
            .supports_schemas(false)
    }
}

/// Normalizes a connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }
    format!("sqlite://{connection_string}")
}
