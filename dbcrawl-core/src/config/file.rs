//! Configuration file loading.

use super::{ConfigLayer, ConfigOrigin};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flag naming configuration files, and its short alias.
const CONFIG_FILE_KEYS: &[&str] = &["configfile", "g"];

/// Loads one configuration file into a layer.
#[async_trait]
pub trait ConfigFileLoader: Send + Sync {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    async fn load(&self, path: &Path) -> Result<ConfigLayer>;
}

/// Loader for TOML configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFileLoader;

#[async_trait]
impl ConfigFileLoader for TomlFileLoader {
    async fn load(&self, path: &Path) -> Result<ConfigLayer> {
        debug!("Loading config file {}", path.display());
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            CrawlError::config(
                "configfile",
                format!("cannot read {}: {e}", path.display()),
            )
        })?;
        ConfigLayer::from_toml_str(ConfigOrigin::File(path.to_path_buf()), &text)
    }
}

/// Configuration files named on the command line, in the order given.
///
/// `-configfile a.toml,b.toml` loads `a.toml` first, so `b.toml` wins on
/// overlapping keys.
pub fn config_file_paths(inline: &ConfigLayer) -> Vec<PathBuf> {
    CONFIG_FILE_KEYS
        .iter()
        .filter_map(|key| inline.get(key))
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}
