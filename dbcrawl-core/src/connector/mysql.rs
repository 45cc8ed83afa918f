//! MySQL connector.

use super::sqlx_connection::SqlxConnection;
use super::{ConnectionOptions, DatabaseConnection, DatabaseConnector};
use crate::error::{CrawlError, Result};
use crate::retrieval::RetrievalOptionsBuilder;
use async_trait::async_trait;
use sqlx::Connection;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use std::str::FromStr;
use tracing::debug;

/// MySQL through `sqlx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    fn server_type(&self) -> &'static str {
        "mysql"
    }

    fn description(&self) -> &'static str {
        "MySQL"
    }

    fn supports_url(&self, url: &str) -> bool {
        url.starts_with("mysql://")
    }

    fn bundled_toml(&self) -> &'static str {
        include_str!("../../bundled/mysql.toml")
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn DatabaseConnection>> {
        let mut connect_options = MySqlConnectOptions::from_str(options.url()).map_err(|e| {
            CrawlError::connection_failed(format!("Invalid MySQL URL {}", options.redacted_url()), e)
        })?;
        let credentials = options.credentials();
        if let Some(user) = credentials.username() {
            connect_options = connect_options.username(user);
        }
        if let Some(password) = credentials.password() {
            connect_options = connect_options.password(password);
        }

        debug!("Connecting to {}", options.redacted_url());
        let connection = MySqlConnection::connect_with(&connect_options)
            .await
            .map_err(|e| {
                CrawlError::connection_failed(
                    format!("Failed to connect to {}", options.redacted_url()),
                    e,
                )
            })?;
        Ok(Box::new(SqlxConnection::new(self.server_type(), connection)))
    }

    /// MySQL databases are schemas; identifiers are quoted with backticks.
    fn retrieval_options_builder(&self) -> RetrievalOptionsBuilder {
        RetrievalOptionsBuilder::new(self.server_type())
            .identifier_quote("`")
            .supports_schemas(false)
    }
}
