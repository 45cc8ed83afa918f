use super::{DatabaseConnector, default_connectors};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Lookup table of available connectors.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: Vec<Arc<dyn DatabaseConnector>>,
}

impl ConnectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every connector compiled into this build.
    pub fn with_default_connectors() -> Self {
        let mut registry = Self::new();
        for connector in default_connectors() {
            registry.register(connector);
        }
        registry
    }

    /// Adds a connector. A later connector with the same server tag replaces
    /// the earlier one.
    pub fn register(&mut self, connector: Arc<dyn DatabaseConnector>) {
        debug!("Registering connector <{}>", connector.server_type());
        self.connectors
            .retain(|existing| existing.server_type() != connector.server_type());
        self.connectors.push(connector);
    }

    /// Connector for a server tag, compared case-insensitively.
    pub fn find_by_server_type(&self, server_type: &str) -> Option<Arc<dyn DatabaseConnector>> {
        let server_type = server_type.trim();
        self.connectors
            .iter()
            .find(|connector| connector.server_type().eq_ignore_ascii_case(server_type))
            .cloned()
    }

    /// First connector that recognizes the URL.
    pub fn find_for_url(&self, url: &str) -> Option<Arc<dyn DatabaseConnector>> {
        self.connectors
            .iter()
            .find(|connector| connector.supports_url(url))
            .cloned()
    }

    /// Registered server tags, in registration order.
    pub fn server_types(&self) -> Vec<&'static str> {
        self.connectors
            .iter()
            .map(|connector| connector.server_type())
            .collect()
    }

    /// Registered connectors, in registration order.
    pub fn connectors(&self) -> impl Iterator<Item = &Arc<dyn DatabaseConnector>> {
        self.connectors.iter()
    }

    /// Whether no connector is registered.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("server_types", &self.server_types())
            .finish()
    }
}
