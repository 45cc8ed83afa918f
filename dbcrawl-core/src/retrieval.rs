//! Connector-specific retrieval settings.
//!
//! Each connector supplies a [`RetrievalOptionsBuilder`] with its own
//! defaults; `retrieval.*` configuration keys then override them.

use crate::config::{ConfigEnum, LayeredConfig};
use crate::error::Result;
use serde::Serialize;

/// How metadata is read from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataRetrievalStrategy {
    /// Driver metadata calls
    #[default]
    Metadata,
    /// Direct queries against the data dictionary
    DataDictionary,
}

impl ConfigEnum for MetadataRetrievalStrategy {
    const TOKENS: &'static [&'static str] = &["metadata", "data_dictionary"];

    fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "metadata" => Some(Self::Metadata),
            "data_dictionary" => Some(Self::DataDictionary),
            _ => None,
        }
    }
}

/// Settings that govern how one connector retrieves metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalOptions {
    /// Connector that produced these options
    pub server_type: String,
    /// Quote used around identifiers
    pub identifier_quote: String,
    /// Whether the server has catalogs
    pub supports_catalogs: bool,
    /// Whether the server has schemas
    pub supports_schemas: bool,
    /// Metadata retrieval strategy
    pub strategy: MetadataRetrievalStrategy,
}

/// Builder for [`RetrievalOptions`].
#[derive(Debug, Clone)]
pub struct RetrievalOptionsBuilder {
    options: RetrievalOptions,
}

impl RetrievalOptionsBuilder {
    /// Generic defaults for a connector.
    pub fn new(server_type: &str) -> Self {
        Self {
            options: RetrievalOptions {
                server_type: server_type.to_string(),
                identifier_quote: "\"".to_string(),
                supports_catalogs: true,
                supports_schemas: true,
                strategy: MetadataRetrievalStrategy::default(),
            },
        }
    }

    /// Sets the identifier quote.
    pub fn identifier_quote(mut self, quote: &str) -> Self {
        self.options.identifier_quote = quote.to_string();
        self
    }

    /// Sets catalog support.
    pub fn supports_catalogs(mut self, supported: bool) -> Self {
        self.options.supports_catalogs = supported;
        self
    }

    /// Sets schema support.
    pub fn supports_schemas(mut self, supported: bool) -> Self {
        self.options.supports_schemas = supported;
        self
    }

    /// Sets the retrieval strategy.
    pub fn strategy(mut self, strategy: MetadataRetrievalStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Applies `retrieval.*` overrides and marks them consumed.
    ///
    /// # Errors
    /// Returns a configuration error when an override has an invalid value.
    pub fn from_config(mut self, config: &mut LayeredConfig) -> Result<Self> {
        let options = &mut self.options;
        if config.has_value("retrieval.identifier_quote") {
            options.identifier_quote =
                config.get_string("retrieval.identifier_quote", &options.identifier_quote);
            config.consume("retrieval.identifier_quote");
        }
        if config.has_value("retrieval.supports_catalogs") {
            options.supports_catalogs =
                config.get_boolean("retrieval.supports_catalogs", options.supports_catalogs)?;
            config.consume("retrieval.supports_catalogs");
        }
        if config.has_value("retrieval.supports_schemas") {
            options.supports_schemas =
                config.get_boolean("retrieval.supports_schemas", options.supports_schemas)?;
            config.consume("retrieval.supports_schemas");
        }
        if config.has_value("retrieval.strategy") {
            options.strategy = config.get_enum("retrieval.strategy", options.strategy)?;
            config.consume("retrieval.strategy");
        }
        Ok(self)
    }

    /// Finishes the options.
    pub fn build(self) -> RetrievalOptions {
        self.options
    }
}
