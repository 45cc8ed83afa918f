//! Merged configuration with precedence and consumption tracking.

use super::{ConfigEnum, ConfigLayer, ConfigOrigin};
use crate::error::{CrawlError, Result};
use crate::inclusion::InclusionRule;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "yes", "no", "on", "off", "1", "0"];

/// A merged configuration value and the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Raw value; `None` for a bare switch
    pub value: Option<String>,
    /// Layer that supplied the value
    pub origin: ConfigOrigin,
}

/// Ordered, mergeable key/value store.
///
/// Later merges win per key. Consuming a key only records that some parser
/// interpreted it; the value stays readable.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    entries: BTreeMap<String, ConfigEntry>,
    consumed: BTreeSet<String>,
}

impl LayeredConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a layer; its entries replace existing ones with the same key.
    pub fn merge(&mut self, layer: ConfigLayer) {
        let (origin, entries) = layer.into_parts();
        debug!("Merging {} entries from {}", entries.len(), origin);
        for (key, value) in entries {
            self.entries.insert(
                key,
                ConfigEntry {
                    value,
                    origin: origin.clone(),
                },
            );
        }
    }

    /// Rewrites alias spellings of a key to its canonical spelling.
    ///
    /// When both spellings are present, the entry from the higher-priority
    /// layer wins; on a tie the alias wins. Running it twice is a no-op.
    pub fn normalize_alias(&mut self, canonical: &str, aliases: &[&str]) {
        for alias in aliases.iter().filter(|alias| **alias != canonical) {
            let Some(entry) = self.entries.remove(*alias) else {
                continue;
            };
            let shadowed = self
                .entries
                .get(canonical)
                .is_some_and(|existing| existing.origin.rank() > entry.origin.rank());
            if shadowed {
                debug!(
                    "Dropping '{}' from {}; '{}' is set at higher priority",
                    alias, entry.origin, canonical
                );
            } else {
                self.entries.insert(canonical.to_string(), entry);
            }
        }
    }

    /// Whether a key is present, with or without a value.
    pub fn has_value(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw value for a key. `None` when absent or value-less.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value.as_deref())
    }

    /// Layer that supplied the current value of a key.
    pub fn origin(&self, key: &str) -> Option<&ConfigOrigin> {
        self.entries.get(key).map(|entry| &entry.origin)
    }

    /// String value, or `default` when absent or value-less.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Boolean value, or `default` when absent or value-less.
    ///
    /// # Errors
    /// Returns a configuration error naming the accepted tokens when the
    /// value is not a recognized boolean.
    pub fn get_boolean(&self, key: &str, default: bool) -> Result<bool> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(unrecognized(key, raw, BOOLEAN_TOKENS)),
        }
    }

    /// Unsigned integer value, or `default` when absent or value-less.
    ///
    /// # Errors
    /// Returns a configuration error when the value is not a non-negative
    /// integer.
    pub fn get_integer(&self, key: &str, default: u32) -> Result<u32> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        raw.trim().parse().map_err(|_| {
            CrawlError::config(key, format!("'{raw}' is not a non-negative integer"))
        })
    }

    /// Enumerated value, or `default` when absent or value-less.
    ///
    /// # Errors
    /// Returns a configuration error naming the accepted tokens when the
    /// value is not recognized.
    pub fn get_enum<T: ConfigEnum>(&self, key: &str, default: T) -> Result<T> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        T::from_token(raw).ok_or_else(|| unrecognized(key, raw, T::TOKENS))
    }

    /// Reads the value as an include pattern and composes it with `current`,
    /// keeping whatever exclude half `current` already holds.
    ///
    /// # Errors
    /// Returns a configuration error naming the key and pattern when the
    /// pattern does not compile.
    pub fn get_inclusion_rule(&self, key: &str, current: &InclusionRule) -> Result<InclusionRule> {
        let pattern = self.get(key).unwrap_or_default();
        current
            .with_include(pattern)
            .map_err(|e| CrawlError::config(key, e.to_string()))
    }

    /// Reads the value as an exclude pattern and composes it with `current`,
    /// keeping whatever include half `current` already holds.
    ///
    /// # Errors
    /// Returns a configuration error naming the key and pattern when the
    /// pattern does not compile.
    pub fn get_exclusion_rule(&self, key: &str, current: &InclusionRule) -> Result<InclusionRule> {
        let pattern = self.get(key).unwrap_or_default();
        current
            .with_exclude(pattern)
            .map_err(|e| CrawlError::config(key, e.to_string()))
    }

    /// Marks a key as interpreted. Advisory only.
    pub fn consume(&mut self, key: &str) {
        self.consumed.insert(key.to_string());
    }

    /// Whether a key has been marked as interpreted.
    pub fn is_consumed(&self, key: &str) -> bool {
        self.consumed.contains(key)
    }

    /// Entries no parser has consumed, in key order.
    pub fn unconsumed(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .filter(|(key, _)| !self.consumed.contains(key.as_str()))
            .map(|(key, entry)| (key.as_str(), entry.value.as_deref()))
    }

    /// All entries, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unrecognized(key: &str, raw: &str, accepted: &[&str]) -> CrawlError {
    CrawlError::config(
        key,
        format!("unrecognized value '{raw}', expected one of: {}", accepted.join(", ")),
    )
}
