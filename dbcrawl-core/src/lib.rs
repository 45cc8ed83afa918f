//! Configuration resolution for the dbcrawl command line.
//!
//! This crate turns raw command-line arguments into everything a metadata
//! crawl needs before it touches a database: the selected connector, a
//! layered configuration, immutable crawl options and connection options.
//! A [`CommandLineSession`] drives the whole pipeline and hands the result to
//! a [`CommandExecutor`].
//!
//! # Security Guarantees
//! - Credentials live in zeroizing containers and are never logged
//! - Connection URLs are redacted in every error and log line
//! - Connectors are only selected from raw arguments, never from files
//!
//! # Architecture
//! - Layered configuration with explicit precedence (bundled, file,
//!   command line, connection)
//! - Small option group parsers composed as an ordered list
//! - Connector plugins behind an object-safe trait, feature-gated per
//!   database

pub mod config;
pub mod connector;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod grep;
pub mod inclusion;
pub mod info_level;
pub mod logging;
pub mod observer;
pub mod options;
pub mod parsers;
pub mod retrieval;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigLayer, ConfigOrigin, LayeredConfig};
pub use connector::{
    ConnectionOptions, ConnectionSource, ConnectorRegistry, DatabaseConnection, DatabaseConnector,
};
pub use credentials::Credentials;
pub use error::{CrawlError, Result};
pub use executor::{CommandExecutor, DiagnosticExecutor, ExecutionContext};
pub use grep::GrepRule;
pub use inclusion::InclusionRule;
pub use info_level::{InfoLevel, RetrievalFlag, SchemaInfoLevel, SchemaInfoLevelBuilder};
pub use observer::{Notice, SessionObserver, SessionState, TracingObserver};
pub use options::{CrawlOptions, CrawlOptionsBuilder, GrepOptions, OutputOptions};
pub use retrieval::{MetadataRetrievalStrategy, RetrievalOptions, RetrievalOptionsBuilder};
pub use session::{CommandLineSession, PreparedSession};
