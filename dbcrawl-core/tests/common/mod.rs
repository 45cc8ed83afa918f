//! Shared fixtures for session integration tests.
//!
//! `MockConnector` answers to the `mockdb` server tag and `mock://` URLs and
//! counts how often its connections are opened and closed.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use dbcrawl_core::config::{ConfigFileLoader, ConfigLayer, TomlFileLoader};
use dbcrawl_core::{
    CommandExecutor, ConnectionOptions, ConnectorRegistry, CrawlError, CrawlOptions,
    DatabaseConnection, DatabaseConnector, ExecutionContext, Notice, Result, RetrievalOptions,
    SessionObserver, SessionState,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const MOCK_TOML: &str = r#"
host = "localhost"
port = 7000
title = "Bundled title"

[connection]
url_template = "mock://{host}:{port}/{database}"
"#;

/// Failure points of the mock connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub connect: bool,
    pub ping: bool,
    pub close: bool,
}

/// Counters shared between the connector and its connections.
#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockConnector {
    pub faults: Faults,
    pub counters: Arc<Counters>,
}

impl MockConnector {
    pub fn new(faults: Faults) -> Self {
        Self {
            faults,
            counters: Arc::new(Counters::default()),
        }
    }
}

#[async_trait]
impl DatabaseConnector for MockConnector {
    fn server_type(&self) -> &'static str {
        "mockdb"
    }

    fn description(&self) -> &'static str {
        "Mock database"
    }

    fn supports_url(&self, url: &str) -> bool {
        url.starts_with("mock://")
    }

    fn bundled_toml(&self) -> &'static str {
        MOCK_TOML
    }

    async fn connect(&self, _options: &ConnectionOptions) -> Result<Box<dyn DatabaseConnection>> {
        if self.faults.connect {
            return Err(CrawlError::connection("mock server refused the connection"));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            faults: self.faults,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockConnection {
    faults: Faults,
    counters: Arc<Counters>,
}

#[async_trait]
impl DatabaseConnection for MockConnection {
    fn server_type(&self) -> &str {
        "mockdb"
    }

    async fn ping(&mut self) -> Result<()> {
        if self.faults.ping {
            Err(CrawlError::connection("connection reset by peer"))
        } else {
            Ok(())
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.faults.close {
            Err(CrawlError::connection("mock server did not acknowledge close"))
        } else {
            Ok(())
        }
    }
}

/// Registry holding the mock connector plus the compiled-in connectors.
pub fn registry(connector: MockConnector) -> (Arc<ConnectorRegistry>, Arc<Counters>) {
    let counters = Arc::clone(&connector.counters);
    let mut registry = ConnectorRegistry::with_default_connectors();
    registry.register(Arc::new(connector));
    (Arc::new(registry), counters)
}

/// What the executor saw.
#[derive(Debug, Clone)]
pub struct Captured {
    pub command: String,
    pub options: CrawlOptions,
    pub retrieval: RetrievalOptions,
}

/// Executor that pings the connection and records its context.
#[derive(Default)]
pub struct CapturingExecutor {
    pub captured: Mutex<Option<Captured>>,
}

#[async_trait]
impl CommandExecutor for CapturingExecutor {
    fn commands(&self) -> &[&'static str] {
        &["list"]
    }

    async fn execute(
        &self,
        context: &ExecutionContext<'_>,
        connection: &mut dyn DatabaseConnection,
    ) -> Result<()> {
        *self.captured.lock().unwrap() = Some(Captured {
            command: context.command.to_string(),
            options: context.options.clone(),
            retrieval: context.retrieval.clone(),
        });
        connection
            .ping()
            .await
            .map_err(|e| CrawlError::execution_failed(context.command, "lost the server", e))
    }
}

/// Observer recording transitions and notices.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub transitions: Mutex<Vec<(SessionState, SessionState)>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<SessionState> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, to)| *to)
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_transition(&self, from: SessionState, to: SessionState) {
        self.transitions.lock().unwrap().push((from, to));
    }

    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

/// TOML loader that counts how many files it was asked for.
#[derive(Debug, Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
}

#[async_trait]
impl ConfigFileLoader for CountingLoader {
    async fn load(&self, path: &Path) -> Result<ConfigLayer> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        TomlFileLoader.load(path).await
    }
}

pub fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| (*t).to_string()).collect()
}
