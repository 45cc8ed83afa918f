//! Command execution against an open connection.
//!
//! The session hands every parsed setting to a [`CommandExecutor`] through an
//! [`ExecutionContext`]. Metadata retrieval and report rendering live behind
//! this trait; [`DiagnosticExecutor`] provides the built-in `ping` and
//! `options` commands.

use crate::config::LayeredConfig;
use crate::connector::DatabaseConnection;
use crate::error::{CrawlError, Result};
use crate::options::{CrawlOptions, OutputOptions};
use crate::retrieval::RetrievalOptions;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Everything a command needs besides the connection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExecutionContext<'a> {
    /// Command name
    pub command: &'a str,
    /// Frozen crawl options
    pub options: &'a CrawlOptions,
    /// Output settings
    pub output: &'a OutputOptions,
    /// Entries no parser interpreted
    pub additional: &'a BTreeMap<String, Option<String>>,
    /// Connector retrieval settings
    pub retrieval: &'a RetrievalOptions,
    /// Full layered configuration
    #[serde(skip)]
    pub config: &'a LayeredConfig,
}

/// Runs one command.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Commands this executor understands, for help output.
    fn commands(&self) -> &[&'static str];

    /// Runs the command in `context` against `connection`.
    ///
    /// # Errors
    /// Returns an execution error if the command fails.
    async fn execute(
        &self,
        context: &ExecutionContext<'_>,
        connection: &mut dyn DatabaseConnection,
    ) -> Result<()>;
}

/// Built-in commands that check the resolved settings end to end.
///
/// - `ping`: round trip to the server
/// - `options`: JSON dump of the resolved options
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticExecutor;

impl DiagnosticExecutor {
    /// Command names handled by this executor.
    pub const COMMANDS: &'static [&'static str] = &["ping", "options"];
}

#[async_trait]
impl CommandExecutor for DiagnosticExecutor {
    fn commands(&self) -> &[&'static str] {
        Self::COMMANDS
    }

    async fn execute(
        &self,
        context: &ExecutionContext<'_>,
        connection: &mut dyn DatabaseConnection,
    ) -> Result<()> {
        match context.command {
            "ping" => {
                connection.ping().await.map_err(|e| {
                    CrawlError::execution_failed(context.command, "server did not answer", e)
                })?;
                info!("Connection to <{}> is alive", connection.server_type());
                let line = format!("{}: ok\n", connection.server_type());
                write_output(context, &line).await
            }
            "options" => {
                let json = serde_json::to_string_pretty(context).map_err(|e| {
                    CrawlError::execution_failed(context.command, "failed to serialize options", e)
                })?;
                write_output(context, &format!("{json}\n")).await
            }
            other => Err(CrawlError::execution(
                other,
                format!("unknown command; available: {}", Self::COMMANDS.join(", ")),
            )),
        }
    }
}

/// Writes command output to the output file, or standard output when none is
/// set.
///
/// # Errors
/// Returns an execution error for the running command, naming the output
/// file on failure.
pub async fn write_output(context: &ExecutionContext<'_>, text: &str) -> Result<()> {
    let command = context.command;
    match &context.output.output_file {
        Some(path) => tokio::fs::write(path, text).await.map_err(|e| {
            CrawlError::execution_failed(
                command,
                format!("failed to write output file {}", path.display()),
                e,
            )
        }),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await.map_err(|e| {
                CrawlError::execution_failed(command, "failed to write to standard output", e)
            })?;
            stdout.flush().await.map_err(|e| {
                CrawlError::execution_failed(command, "failed to flush standard output", e)
            })
        }
    }
}
