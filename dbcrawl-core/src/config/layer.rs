//! A single configuration source.

use crate::error::{CrawlError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a configuration entry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Defaults bundled with the named connector
    Bundled(String),
    /// A configuration file
    File(PathBuf),
    /// Inline command-line arguments
    CommandLine,
    /// Connection settings parsed from arguments during connection acquisition
    Connection,
}

impl ConfigOrigin {
    /// Merge priority, lowest first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Bundled(_) => 0,
            Self::File(_) => 1,
            Self::CommandLine => 2,
            Self::Connection => 3,
        }
    }
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled(connector) => write!(f, "bundled config of <{connector}>"),
            Self::File(path) => write!(f, "config file {}", path.display()),
            Self::CommandLine => f.write_str("command line"),
            Self::Connection => f.write_str("connection arguments"),
        }
    }
}

/// A set of key/value entries from one origin.
///
/// Values are raw strings; a key with no value is a bare switch such as
/// `-invert-match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    origin: ConfigOrigin,
    entries: BTreeMap<String, Option<String>>,
}

impl ConfigLayer {
    /// Creates an empty layer.
    pub fn new(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            entries: BTreeMap::new(),
        }
    }

    /// Parses TOML text into a layer. Nested tables are flattened into dotted
    /// keys; arrays become comma-separated lists.
    ///
    /// # Errors
    /// Returns a configuration error if the text is not valid TOML or holds a
    /// value that cannot be represented as a string.
    pub fn from_toml_str(origin: ConfigOrigin, text: &str) -> Result<Self> {
        let table: toml::Table = text
            .parse()
            .map_err(|e| CrawlError::config("configfile", format!("{origin}: {e}")))?;
        let mut layer = Self::new(origin);
        layer.flatten_table("", &table)?;
        Ok(layer)
    }

    fn flatten_table(&mut self, prefix: &str, table: &toml::Table) -> Result<()> {
        for (name, value) in table {
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match value {
                toml::Value::Table(nested) => self.flatten_table(&key, nested)?,
                toml::Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(|item| scalar_to_string(&key, item))
                        .collect::<Result<Vec<_>>>()?
                        .join(",");
                    self.insert(key, Some(joined));
                }
                scalar => {
                    let text = scalar_to_string(&key, scalar)?;
                    self.insert(key, Some(text));
                }
            }
        }
        Ok(())
    }

    /// Inserts an entry, replacing an existing one with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.entries.insert(key.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: Option<&str>) -> Self {
        self.insert(key, value.map(str::to_string));
        self
    }

    /// Origin of every entry in this layer.
    pub fn origin(&self) -> &ConfigOrigin {
        &self.origin
    }

    /// Whether the key is present, with or without a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw value for a key. `None` when absent or value-less.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|value| value.as_deref())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the layer has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Copy of this layer restricted to `keys`, under a new origin.
    pub fn select(&self, keys: &[&str], origin: ConfigOrigin) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| keys.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self { origin, entries }
    }

    pub(crate) fn into_parts(self) -> (ConfigOrigin, BTreeMap<String, Option<String>>) {
        (self.origin, self.entries)
    }
}

fn scalar_to_string(key: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(text) => Ok(text.clone()),
        toml::Value::Integer(number) => Ok(number.to_string()),
        toml::Value::Float(number) => Ok(number.to_string()),
        toml::Value::Boolean(flag) => Ok(flag.to_string()),
        toml::Value::Datetime(datetime) => Ok(datetime.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => Err(CrawlError::config(
            key,
            "nested arrays and tables inside arrays are not supported",
        )),
    }
}
