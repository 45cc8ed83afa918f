//! A single unpooled `sqlx` connection behind [`DatabaseConnection`].

use super::DatabaseConnection;
use crate::error::{CrawlError, Result};
use async_trait::async_trait;

/// Wraps one `sqlx` connection.
pub(crate) struct SqlxConnection<C> {
    server_type: &'static str,
    inner: C,
}

impl<C> SqlxConnection<C> {
    pub(crate) fn new(server_type: &'static str, inner: C) -> Self {
        Self { server_type, inner }
    }
}

#[async_trait]
impl<C> DatabaseConnection for SqlxConnection<C>
where
    C: sqlx::Connection + 'static,
{
    fn server_type(&self) -> &str {
        self.server_type
    }

    async fn ping(&mut self) -> Result<()> {
        self.inner.ping().await.map_err(|e| {
            CrawlError::connection_failed(format!("Ping to {} failed", self.server_type), e)
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let Self { server_type, inner } = *self;
        inner.close().await.map_err(|e| {
            CrawlError::connection_failed(format!("Failed to close {server_type} connection"), e)
        })
    }
}
