//! PostgreSQL connector.
//!
//! # Connection String Formats
//! - `postgresql://host:port/database`
//! - `postgres://user@host/database?sslmode=require`

use super::sqlx_connection::SqlxConnection;
use super::{ConnectionOptions, DatabaseConnection, DatabaseConnector};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use std::str::FromStr;
use tracing::debug;

/// PostgreSQL through `sqlx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

#[async_trait]
impl DatabaseConnector for PostgresConnector {
    fn server_type(&self) -> &'static str {
        "postgresql"
    }

    fn description(&self) -> &'static str {
        "PostgreSQL"
    }

    fn supports_url(&self, url: &str) -> bool {
        url.starts_with("postgres://") || url.starts_with("postgresql://")
    }

    fn bundled_toml(&self) -> &'static str {
        include_str!("../../bundled/postgresql.toml")
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn DatabaseConnection>> {
        let mut connect_options = PgConnectOptions::from_str(options.url()).map_err(|e| {
            CrawlError::connection_failed(
                format!("Invalid PostgreSQL URL {}", options.redacted_url()),
                e,
            )
        })?;
        let credentials = options.credentials();
        if let Some(user) = credentials.username() {
            connect_options = connect_options.username(user);
        }
        if let Some(password) = credentials.password() {
            connect_options = connect_options.password(password);
        }

        debug!("Connecting to {}", options.redacted_url());
        let connection = PgConnection::connect_with(&connect_options)
            .await
            .map_err(|e| {
                CrawlError::connection_failed(
                    format!("Failed to connect to {}", options.redacted_url()),
                    e,
                )
            })?;
        Ok(Box::new(SqlxConnection::new(self.server_type(), connection)))
    }
}
