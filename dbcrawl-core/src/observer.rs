//! Session state transitions and notices.
//!
//! Every session owns one [`SessionObserver`]. Observers never influence the
//! outcome of a session; they only see what happened.

use std::fmt;
use tracing::{debug, info, warn};

/// States of the command-line session life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Arguments received, nothing checked yet
    Init,
    /// Selecting a connector from raw arguments
    ResolveConnector,
    /// Merging bundled, file and inline configuration
    LoadConfig,
    /// Running the option group parsers
    ParseOptions,
    /// Building connection options
    AcquireConnection,
    /// Running the command against an open connection
    Execute,
    /// Closing the connection
    Release,
    /// Finished successfully
    Done,
    /// Aborted by an error
    Failed,
}

impl SessionState {
    /// Whether no further transition can follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::ResolveConnector => "RESOLVE_CONNECTOR",
            Self::LoadConfig => "LOAD_CONFIG",
            Self::ParseOptions => "PARSE_OPTIONS",
            Self::AcquireConnection => "ACQUIRE_CONNECTION",
            Self::Execute => "EXECUTE",
            Self::Release => "RELEASE",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Informational events raised while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A connector was chosen
    ConnectorSelected {
        /// Tag of the chosen connector
        server_type: String,
        /// True when `-server` picked it, false for URL detection
        by_server_tag: bool,
    },
    /// A configuration file was merged
    ConfigFileLoaded {
        /// Path as given on the command line
        path: String,
    },
    /// A value from the command line replaces a lower-priority one
    Override {
        /// Overridden key
        key: String,
        /// New value
        value: String,
    },
    /// A recommended option was not supplied
    MissingRecommended {
        /// Option that was left out
        key: String,
        /// What happens without it
        advice: String,
    },
    /// An option group finished parsing
    ParserApplied {
        /// Parser name
        parser: &'static str,
    },
    /// Releasing the connection failed after the command had already failed
    ReleaseFailed {
        /// Redacted release error
        message: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectorSelected {
                server_type,
                by_server_tag: true,
            } => write!(f, "Using connector <{server_type}> from server tag"),
            Self::ConnectorSelected { server_type, .. } => {
                write!(f, "Using connector <{server_type}> from connection URL")
            }
            Self::ConfigFileLoaded { path } => write!(f, "Loaded config file {path}"),
            Self::Override { key, value } => {
                write!(f, "Overriding {key} from command line: {value}")
            }
            Self::MissingRecommended { key, advice } => {
                write!(f, "No -{key} option was provided; {advice}")
            }
            Self::ParserApplied { parser } => write!(f, "Parsed {parser} options"),
            Self::ReleaseFailed { message } => {
                write!(f, "Connection release failed: {message}")
            }
        }
    }
}

/// Sink for session transitions and notices.
pub trait SessionObserver: Send + Sync {
    /// Called on every state change, including the move to `Failed`.
    fn on_transition(&self, _from: SessionState, _to: SessionState) {}

    /// Called for every notice.
    fn on_notice(&self, _notice: &Notice) {}
}

/// Forwards transitions and notices to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_transition(&self, from: SessionState, to: SessionState) {
        debug!("Session state {} -> {}", from, to);
    }

    fn on_notice(&self, notice: &Notice) {
        match notice {
            Notice::MissingRecommended { .. } | Notice::ReleaseFailed { .. } => {
                warn!("{}", notice);
            }
            Notice::ParserApplied { .. } => debug!("{}", notice),
            _ => info!("{}", notice),
        }
    }
}
