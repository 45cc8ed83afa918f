//! Logging setup for the dbcrawl binary.
//!
//! Library code only emits `tracing` events; installing the subscriber is
//! left to the binary.

use crate::error::{CrawlError, Result};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive that replaces
/// the verbosity flags, such as `DBCRAWL_LOG=dbcrawl_core=trace`.
pub const LOG_ENV_VAR: &str = "DBCRAWL_LOG";

/// Maximum level for the given verbosity.
///
/// `quiet` wins over any verbosity; otherwise 0 is INFO, 1 is DEBUG and
/// anything higher is TRACE.
pub fn log_level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Initializes structured logging on standard error.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns a configuration error if `DBCRAWL_LOG` holds an invalid filter or
/// a global subscriber is already installed.
///
/// # Example
/// ```rust,no_run
/// use dbcrawl_core::logging::init_logging;
///
/// init_logging(1, false)?;
/// # Ok::<(), dbcrawl_core::CrawlError>(())
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .map_err(|e| CrawlError::config(LOG_ENV_VAR, e.to_string()))?,
        _ => EnvFilter::default()
            .add_directive(LevelFilter::from_level(log_level(verbose, quiet)).into()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            CrawlError::config(LOG_ENV_VAR, format!("Failed to initialize logging: {e}"))
        })
}
