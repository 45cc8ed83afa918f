//! Layered configuration for a single command-line session.
//!
//! Configuration arrives from several sources, merged lowest to highest
//! priority:
//! - `ConfigLayer` with `ConfigOrigin::Bundled`: defaults shipped with the connector
//! - `ConfigOrigin::File`: TOML files named by `-configfile`
//! - `ConfigOrigin::CommandLine`: inline arguments
//! - `ConfigOrigin::Connection`: connection settings re-read from arguments
//!
//! `LayeredConfig` keeps the merged view plus an advisory set of consumed
//! keys.

pub mod args;
mod file;
mod layer;
mod layered;

pub use file::{ConfigFileLoader, TomlFileLoader, config_file_paths};
pub use layer::{ConfigLayer, ConfigOrigin};
pub use layered::{ConfigEntry, LayeredConfig};

/// Enumerations that can be read from a configuration value.
///
/// `TOKENS` lists the accepted spellings and is quoted back to the user when
/// a value is not recognized.
pub trait ConfigEnum: Sized + Copy {
    /// Accepted tokens, for error messages
    const TOKENS: &'static [&'static str];

    /// Parses a token, returning `None` when it is not recognized.
    fn from_token(token: &str) -> Option<Self>;
}
