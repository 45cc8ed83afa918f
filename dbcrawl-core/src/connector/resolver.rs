//! Connector selection from raw arguments.
//!
//! Resolution order:
//! 1. explicit server tag (`-server <tag>`)
//! 2. connection URL (`-url <url>`)
//! 3. any other argument a registered connector recognizes as a URL
//!
//! Only raw arguments are inspected; configuration files are not loaded yet.

use super::{ConnectorRegistry, DatabaseConnector, URL_TEMPLATE_KEY};
use crate::config::args::find_value;
use crate::error::{CrawlError, Result, redact_database_url};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How connection settings are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    /// Selected by server tag; the URL is built from the bundled template
    ServerTag,
    /// Selected from a connection URL, which is used as given
    Url,
}

impl ConnectionSource {
    /// Keys re-read from the arguments when acquiring the connection.
    pub fn connection_keys(self) -> &'static [&'static str] {
        match self {
            Self::ServerTag => super::SERVER_CONNECTION_KEYS,
            Self::Url => super::URL_CONNECTION_KEYS,
        }
    }

    /// Key reported when the connection URL is unusable.
    pub fn url_key(self) -> &'static str {
        match self {
            Self::ServerTag => URL_TEMPLATE_KEY,
            Self::Url => "url",
        }
    }
}

/// A connector chosen for one session.
#[derive(Clone)]
pub struct ResolvedConnector {
    /// The selected connector
    pub connector: Arc<dyn DatabaseConnector>,
    /// How the connector was selected
    pub source: ConnectionSource,
    /// URL found among the arguments without a `-url` flag
    pub inferred_url: Option<String>,
}

impl fmt::Debug for ResolvedConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConnector")
            .field("server_type", &self.connector.server_type())
            .field("source", &self.source)
            .field("inferred_url", &self.inferred_url.as_deref().map(redact_database_url))
            .finish()
    }
}

/// Selects a connector from raw arguments.
///
/// # Errors
/// Returns a no-connector-found error when the server tag is unknown, the
/// `-url` value is not recognized, or nothing identifies a connector.
pub fn resolve(args: &[String], registry: &ConnectorRegistry) -> Result<ResolvedConnector> {
    if let Some(server_type) = find_value(args, &["server"]) {
        let connector = registry.find_by_server_type(server_type).ok_or_else(|| {
            CrawlError::no_connector(format!(
                "no connector for server type '{}'; available: {}",
                server_type,
                registry.server_types().join(", ")
            ))
        })?;
        debug!("Resolved connector <{}> from server tag", connector.server_type());
        return Ok(ResolvedConnector {
            connector,
            source: ConnectionSource::ServerTag,
            inferred_url: None,
        });
    }

    if let Some(url) = find_value(args, &["url"]) {
        let connector = registry.find_for_url(url).ok_or_else(|| {
            CrawlError::no_connector(format!(
                "no connector recognizes the connection URL {}",
                redact_database_url(url)
            ))
        })?;
        debug!("Resolved connector <{}> from -url", connector.server_type());
        return Ok(ResolvedConnector {
            connector,
            source: ConnectionSource::Url,
            inferred_url: None,
        });
    }

    for token in args {
        let candidate = token
            .strip_prefix('-')
            .and_then(|flag| flag.split_once('='))
            .map_or(token.as_str(), |(_, value)| value);
        if let Some(connector) = registry.find_for_url(candidate) {
            debug!("Resolved connector <{}> from an argument", connector.server_type());
            return Ok(ResolvedConnector {
                connector,
                source: ConnectionSource::Url,
                inferred_url: Some(candidate.to_string()),
            });
        }
    }

    Err(CrawlError::no_connector(
        "specify -server <type> or a connection -url",
    ))
}
