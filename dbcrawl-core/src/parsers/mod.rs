//! Option group parsers.
//!
//! Each parser owns a disjoint set of configuration keys. The session first
//! asks every parser to normalize its aliases, then calls
//! [`OptionGroupParser::apply`] on each in the order returned by
//! [`default_parsers`]. For every owned key a parser either applies the
//! documented default (key absent) or reads the key through a typed getter,
//! validates it, updates [`ParseState`] and marks the key consumed.

use crate::config::{ConfigOrigin, LayeredConfig};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::observer::{Notice, SessionObserver};
use crate::options::{CrawlOptionsBuilder, OutputOptions};
use std::collections::BTreeMap;

mod additional;
mod command;
mod crawl;
mod credentials;
mod filter;
mod output;

pub use additional::AdditionalConfigParser;
pub use command::CommandParser;
pub use crawl::CrawlOptionsParser;
pub use credentials::{PasswordPrompt, UserCredentialsParser};
pub use filter::FilterOptionsParser;
pub use output::OutputOptionsParser;

/// Canonical key and its alternative spellings.
pub type AliasTable = &'static [(&'static str, &'static [&'static str])];

/// Everything the parsers produce, accumulated across option groups.
#[derive(Debug, Default)]
pub struct ParseState {
    /// The single command to run
    pub command: Option<String>,
    /// Crawl options under construction
    pub options: CrawlOptionsBuilder,
    /// Output settings
    pub output: OutputOptions,
    /// Entries no parser interpreted, passed through to the executor
    pub additional: BTreeMap<String, Option<String>>,
    /// Database user and password
    pub credentials: Credentials,
}

/// One group of related command-line options.
pub trait OptionGroupParser: Send + Sync {
    /// Short name used in notices and logs.
    fn name(&self) -> &'static str;

    /// Alias spellings of the keys this parser owns.
    fn aliases(&self) -> AliasTable {
        &[]
    }

    /// Rewrites every alias this parser knows to its canonical key.
    fn normalize_aliases(&self, config: &mut LayeredConfig) {
        for (canonical, aliases) in self.aliases() {
            config.normalize_alias(canonical, aliases);
        }
    }

    /// Reads the owned keys and updates the parse state.
    ///
    /// # Errors
    /// Returns an error naming the offending key when a value is invalid.
    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        observer: &dyn SessionObserver,
    ) -> Result<()>;
}

/// Parsers in the order the session runs them.
///
/// The credentials parser prompts through `rpassword` when
/// `-password:prompt` is given.
pub fn default_parsers() -> Vec<Box<dyn OptionGroupParser>> {
    vec![
        Box::new(CommandParser),
        Box::new(FilterOptionsParser),
        Box::new(CrawlOptionsParser),
        Box::new(OutputOptionsParser),
        Box::new(AdditionalConfigParser),
        Box::new(UserCredentialsParser::default()),
    ]
}

/// Reads a switch that may be given bare (`-noemptytables`) or with an
/// explicit value (`-noemptytables=false`). `None` when absent.
pub(crate) fn read_switch(config: &LayeredConfig, key: &str) -> Result<Option<bool>> {
    if config.has_value(key) {
        config.get_boolean(key, true).map(Some)
    } else {
        Ok(None)
    }
}

/// Emits an override notice when the current value of `key` came from the
/// command line.
pub(crate) fn notice_override(config: &LayeredConfig, key: &str, observer: &dyn SessionObserver) {
    if config.origin(key) == Some(&ConfigOrigin::CommandLine) {
        observer.on_notice(&Notice::Override {
            key: key.to_string(),
            value: config.get(key).unwrap_or_default().to_string(),
        });
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::command_line;
    use super::*;

    #[test]
    fn test_parser_order() {
        let names: Vec<_> = default_parsers().iter().map(|parser| parser.name()).collect();
        assert_eq!(
            names,
            vec!["command", "filter", "crawl", "output", "additional", "credentials"]
        );
    }

    #[test]
    fn test_aliases_are_disjoint() {
        let parsers = default_parsers();
        let mut seen = std::collections::BTreeSet::new();
        for parser in &parsers {
            for (canonical, aliases) in parser.aliases() {
                assert!(seen.insert(*canonical), "duplicate key {canonical}");
                for alias in *aliases {
                    assert!(seen.insert(*alias), "duplicate alias {alias}");
                }
            }
        }
    }

    #[test]
    fn test_read_switch() {
        let config = command_line(&[("noemptytables", None), ("invert-match", Some("no"))]);
        assert_eq!(read_switch(&config, "noemptytables").unwrap(), Some(true));
        assert_eq!(read_switch(&config, "invert-match").unwrap(), Some(false));
        assert_eq!(read_switch(&config, "only-matching").unwrap(), None);
    }
}
