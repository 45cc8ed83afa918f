use super::{OptionGroupParser, ParseState};
use crate::config::LayeredConfig;
use crate::error::Result;
use crate::observer::SessionObserver;
use tracing::debug;

/// Keys handled outside the option parsers.
const RESERVED_KEYS: &[&str] = &[
    "server", "url", "host", "port", "database", "urlx", "user", "u", "configfile", "g",
];

/// Key prefixes handled outside the option parsers.
const RESERVED_PREFIXES: &[&str] = &["password", "retrieval.", "connection."];

/// Whether a key is reserved for connection, credential or config-file
/// handling.
fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key) || RESERVED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Folds every unclaimed entry into the pass-through bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionalConfigParser;

impl OptionGroupParser for AdditionalConfigParser {
    fn name(&self) -> &'static str {
        "additional"
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        _observer: &dyn SessionObserver,
    ) -> Result<()> {
        let extra: Vec<(String, Option<String>)> = config
            .unconsumed()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.to_string(), value.map(str::to_string)))
            .collect();
        for (key, value) in extra {
            debug!("Passing '{}' through to the executor", key);
            config.consume(&key);
            state.additional.insert(key, value);
        }
        Ok(())
    }
}
