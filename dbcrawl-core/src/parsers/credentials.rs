//! Database user and password.
//!
//! The password comes from exactly one source: `-password`,
//! `-password:env <VAR>`, `-password:file <path>` or `-password:prompt`.
//! When several are present, the one from the highest-priority layer wins;
//! on a tie the earlier source in that list wins.

use super::{AliasTable, OptionGroupParser, ParseState, read_switch};
use crate::config::LayeredConfig;
use crate::credentials::Credentials;
use crate::error::{CrawlError, Result};
use crate::observer::SessionObserver;
use tracing::debug;
use zeroize::Zeroizing;

const PASSWORD_SOURCES: &[&str] = &["password", "password:env", "password:file", "password:prompt"];

/// Reads an interactive password. Receives the prompt text.
pub type PasswordPrompt = fn(&str) -> std::io::Result<String>;

/// Reads the user and resolves one password source.
#[derive(Debug, Clone, Copy)]
pub struct UserCredentialsParser {
    prompt: PasswordPrompt,
}

impl Default for UserCredentialsParser {
    fn default() -> Self {
        Self::with_prompt(prompt_terminal)
    }
}

fn prompt_terminal(prompt: &str) -> std::io::Result<String> {
    rpassword::prompt_password(prompt)
}

impl UserCredentialsParser {
    /// Creates a parser that reads interactive passwords through `prompt`.
    pub fn with_prompt(prompt: PasswordPrompt) -> Self {
        Self { prompt }
    }

    fn password(&self, config: &LayeredConfig, source: &str) -> Result<Option<String>> {
        match source {
            "password" => Ok(config.get("password").map(str::to_string)),
            "password:env" => {
                let variable = required(config, source)?;
                std::env::var(variable).map(Some).map_err(|_| {
                    CrawlError::config(
                        source,
                        format!("environment variable '{variable}' is not set"),
                    )
                })
            }
            "password:file" => {
                let path = required(config, source)?;
                let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
                    CrawlError::config(source, format!("cannot read password file {path}: {e}"))
                })?);
                Ok(Some(contents.lines().next().unwrap_or_default().to_string()))
            }
            _ => {
                if read_switch(config, source)? != Some(true) {
                    return Ok(None);
                }
                let user = config.get("user").unwrap_or("database user");
                (self.prompt)(&format!("Password for {user}: "))
                    .map(Some)
                    .map_err(|e| CrawlError::config(source, format!("cannot read password: {e}")))
            }
        }
    }
}

impl OptionGroupParser for UserCredentialsParser {
    fn name(&self) -> &'static str {
        "credentials"
    }

    fn aliases(&self) -> AliasTable {
        &[("user", &["u"])]
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        _observer: &dyn SessionObserver,
    ) -> Result<()> {
        let user = config.get("user").map(str::to_string);
        config.consume("user");

        let source = PASSWORD_SOURCES
            .iter()
            .filter(|source| config.has_value(source))
            .fold(None::<&str>, |best, source| match best {
                Some(best) if rank(config, best) >= rank(config, source) => Some(best),
                _ => Some(*source),
            });
        let password = match source {
            Some(source) => {
                debug!("Reading password from -{}", source);
                self.password(config, source)?
            }
            None => None,
        };
        for source in PASSWORD_SOURCES {
            config.consume(source);
        }

        state.credentials = Credentials::new(user, password);
        Ok(())
    }
}

fn rank(config: &LayeredConfig, key: &str) -> u8 {
    config.origin(key).map_or(0, |origin| origin.rank())
}

fn required<'a>(config: &'a LayeredConfig, key: &str) -> Result<&'a str> {
    config
        .get(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CrawlError::config(key, "a value is required"))
}
