//! Database connector plugins.
//!
//! A [`DatabaseConnector`] identifies one database product. It supplies the
//! bundled configuration defaults, recognizes connection URLs, turns
//! credentials plus layered configuration into [`ConnectionOptions`], and
//! opens a [`DatabaseConnection`].
//!
//! # Security
//! - Connection URLs are redacted in every `Display`/`Debug` rendering
//! - Passwords travel in [`Credentials`] and are handed straight to the driver
//!
//! # Module Structure
//! - `registry`: connector lookup by server tag or URL
//! - `resolver`: connector selection from raw arguments
//! - Connector modules (postgres, mysql, sqlite), feature-gated

use crate::config::{ConfigLayer, ConfigOrigin, LayeredConfig};
use crate::credentials::Credentials;
use crate::error::{CrawlError, Result, redact_database_url};
use crate::retrieval::RetrievalOptionsBuilder;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

mod registry;
mod resolver;

#[cfg(feature = "sqlx")]
mod sqlx_connection;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgresql")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::MySqlConnector;
#[cfg(feature = "postgresql")]
pub use postgres::PostgresConnector;
pub use registry::ConnectorRegistry;
pub use resolver::{ConnectionSource, ResolvedConnector, resolve};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;

/// Keys re-read from the arguments when connecting to a server by tag.
pub const SERVER_CONNECTION_KEYS: &[&str] = &["host", "port", "database", "urlx"];

/// Keys re-read from the arguments when connecting by URL.
pub const URL_CONNECTION_KEYS: &[&str] = &["url"];

/// Bundled configuration key holding the URL template.
pub const URL_TEMPLATE_KEY: &str = "connection.url_template";

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").ok());

/// Plugin for one database product.
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Arc<dyn DatabaseConnector>`.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Server tag selecting this connector, such as `postgresql`.
    fn server_type(&self) -> &'static str;

    /// Human-readable name.
    fn description(&self) -> &'static str;

    /// Whether this connector handles the given connection URL.
    fn supports_url(&self, url: &str) -> bool;

    /// Bundled TOML defaults for this connector.
    fn bundled_toml(&self) -> &'static str;

    /// Bundled defaults as the lowest-priority configuration layer.
    ///
    /// # Errors
    /// Returns a configuration error if the bundled TOML is invalid.
    fn bundled_config(&self) -> Result<ConfigLayer> {
        ConfigLayer::from_toml_str(
            ConfigOrigin::Bundled(self.server_type().to_string()),
            self.bundled_toml(),
        )
    }

    /// Builds connection options from credentials and layered configuration.
    ///
    /// # Errors
    /// Returns a configuration error if no URL can be assembled.
    fn new_connection_options(
        &self,
        credentials: Credentials,
        config: &LayeredConfig,
        source: ConnectionSource,
    ) -> Result<ConnectionOptions> {
        let url = connection_url(config, source)?;
        if !self.supports_url(&url) {
            return Err(CrawlError::config(
                source.url_key(),
                format!(
                    "{} is not a {} URL",
                    redact_database_url(&url),
                    self.description()
                ),
            ));
        }
        Ok(ConnectionOptions::new(self.server_type(), url, credentials))
    }

    /// Opens one connection.
    ///
    /// # Errors
    /// Returns a connection error if the server cannot be reached.
    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn DatabaseConnection>>;

    /// Retrieval defaults for this connector.
    fn retrieval_options_builder(&self) -> RetrievalOptionsBuilder {
        RetrievalOptionsBuilder::new(self.server_type())
    }
}

/// An open connection, used by exactly one command.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Server tag of the connector that opened this connection.
    fn server_type(&self) -> &str;

    /// Checks that the server still answers.
    ///
    /// # Errors
    /// Returns a connection error if the round trip fails.
    async fn ping(&mut self) -> Result<()>;

    /// Closes the connection.
    ///
    /// # Errors
    /// Returns a connection error if the server rejects the shutdown.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Everything a connector needs to open a connection.
#[derive(Clone)]
pub struct ConnectionOptions {
    server_type: String,
    url: String,
    credentials: Credentials,
}

impl ConnectionOptions {
    /// Creates connection options.
    pub fn new(server_type: &str, url: String, credentials: Credentials) -> Self {
        Self {
            server_type: server_type.to_string(),
            url,
            credentials,
        }
    }

    /// Connector server tag.
    pub fn server_type(&self) -> &str {
        &self.server_type
    }

    /// Connection URL. May contain a password; log [`Self::redacted_url`]
    /// instead.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection URL with any password masked.
    pub fn redacted_url(&self) -> String {
        redact_database_url(&self.url)
    }

    /// Credentials supplied outside the URL.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("server_type", &self.server_type)
            .field("url", &self.redacted_url())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl fmt::Display for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.server_type, self.redacted_url())
    }
}

/// Assembles the connection URL.
///
/// By URL, the `url` key is used as given. By server tag, the bundled
/// `connection.url_template` is filled from `{host}`, `{port}` and
/// `{database}`, and `urlx` is appended as query parameters.
///
/// # Errors
/// Returns a configuration error naming the key whose value is missing.
pub fn connection_url(config: &LayeredConfig, source: ConnectionSource) -> Result<String> {
    if source == ConnectionSource::Url {
        return config
            .get("url")
            .filter(|url| !url.trim().is_empty())
            .map(|url| url.trim().to_string())
            .ok_or_else(|| CrawlError::config("url", "a connection URL is required"));
    }

    let template = config
        .get(URL_TEMPLATE_KEY)
        .ok_or_else(|| CrawlError::config(URL_TEMPLATE_KEY, "no connection URL template"))?;
    let placeholder = PLACEHOLDER
        .as_ref()
        .ok_or_else(|| CrawlError::config(URL_TEMPLATE_KEY, "invalid placeholder pattern"))?;

    let mut url = String::with_capacity(template.len());
    let mut last = 0;
    for captures in placeholder.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = config
            .get(name.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CrawlError::config(
                    name.as_str(),
                    format!("a value is required for {{{}}} in the connection URL", name.as_str()),
                )
            })?;
        url.push_str(&template[last..whole.start()]);
        url.push_str(value);
        last = whole.end();
    }
    url.push_str(&template[last..]);

    if let Some(extra) = config.get("urlx").map(str::trim).filter(|extra| !extra.is_empty()) {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(extra.trim_start_matches(['?', '&']));
    }
    Ok(url)
}

/// Every connector compiled into this build.
pub fn default_connectors() -> Vec<std::sync::Arc<dyn DatabaseConnector>> {
    #[allow(unused_mut)]
    let mut connectors: Vec<std::sync::Arc<dyn DatabaseConnector>> = Vec::new();
    #[cfg(feature = "postgresql")]
    connectors.push(std::sync::Arc::new(PostgresConnector));
    #[cfg(feature = "mysql")]
    connectors.push(std::sync::Arc::new(MySqlConnector));
    #[cfg(feature = "sqlite")]
    connectors.push(std::sync::Arc::new(SqliteConnector));
    connectors
}
