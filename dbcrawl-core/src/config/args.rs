//! Tokenizer for raw command-line arguments.
//!
//! Option flags use single-dash long names (`-schemas PUBLIC`), which is why
//! they are tokenized here rather than by `clap`. Rules:
//! - `-key value` or `--key value`: the next token is the value unless it
//!   starts with `-`
//! - `-key=value`: explicit value, required for values starting with `-`
//! - known switches never take a separate value token
//! - any other token is positional; the single positional is the command

use super::{ConfigLayer, ConfigOrigin};
use crate::error::{CrawlError, Result};

/// Flags that never consume the following token as their value.
pub const SWITCHES: &[&str] = &[
    "invert-match",
    "only-matching",
    "noemptytables",
    "password:prompt",
];

/// Switches of the `dbcrawl` binary itself. They are only honored before the
/// crawl arguments, so finding one here means it was misplaced.
const BINARY_SWITCHES: &[&str] = &["verbose", "quiet", "list-connectors"];

/// Key under which the positional command token is stored.
pub const COMMAND_KEY: &str = "command";

/// Tokenizes raw arguments into an inline-override layer.
///
/// # Errors
/// Returns a command-line error for a lone dash, an empty key, a binary
/// switch given after the crawl arguments, or more than one command.
pub fn tokenize(args: &[String]) -> Result<ConfigLayer> {
    let mut layer = ConfigLayer::new(ConfigOrigin::CommandLine);
    let mut tokens = args.iter().peekable();

    while let Some(token) = tokens.next() {
        let Some(flag) = flag_body(token) else {
            set_command(&mut layer, token)?;
            continue;
        };
        if flag.is_empty() {
            return Err(CrawlError::command_line(format!(
                "unexpected argument '{token}'"
            )));
        }

        let (key, value) = match flag.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None if is_switch(flag) => (flag, None),
            None => (flag, tokens.next_if(|next| !is_flag(next)).cloned()),
        };
        if key.is_empty() {
            return Err(CrawlError::command_line(format!(
                "missing option name in '{token}'"
            )));
        }
        if BINARY_SWITCHES.contains(&key) {
            return Err(CrawlError::command_line(format!(
                "'{token}' must come before the crawl arguments"
            )));
        }
        if key == COMMAND_KEY
            && let Some(existing) = layer.get(COMMAND_KEY)
        {
            return Err(duplicate_command(existing, value.as_deref().unwrap_or("")));
        }
        layer.insert(key, value);
    }

    Ok(layer)
}

/// Finds the value of the first occurrence of any of `keys` without fully
/// tokenizing. Used before the layered configuration exists.
pub fn find_value<'a>(args: &'a [String], keys: &[&str]) -> Option<&'a str> {
    let mut tokens = args.iter().peekable();
    while let Some(token) = tokens.next() {
        let Some(flag) = flag_body(token) else {
            continue;
        };
        match flag.split_once('=') {
            Some((key, value)) if keys.contains(&key) => return Some(value),
            Some(_) => {}
            None if keys.contains(&flag) => {
                return tokens.next_if(|next| !is_flag(next)).map(String::as_str);
            }
            None if is_switch(flag) => {}
            None => {
                tokens.next_if(|next| !is_flag(next));
            }
        }
    }
    None
}

fn set_command(layer: &mut ConfigLayer, token: &str) -> Result<()> {
    if let Some(existing) = layer.get(COMMAND_KEY) {
        return Err(duplicate_command(existing, token));
    }
    layer.insert(COMMAND_KEY, Some(token.to_string()));
    Ok(())
}

fn duplicate_command(existing: &str, extra: &str) -> CrawlError {
    CrawlError::command_line(format!(
        "only one command may be given, found '{existing}' and '{extra}'"
    ))
}

/// Body of a flag token with its leading dashes removed, or `None` for a
/// positional token.
fn flag_body(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
}

fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

fn is_switch(key: &str) -> bool {
    SWITCHES.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn test_flags_values_and_command() {
        let layer = tokenize(&args(&[
            "-schemas", "^PUBLIC$", "--tables", ".*", "-title=Weekly report", "details",
        ]))
        .unwrap();

        assert_eq!(layer.get("schemas"), Some("^PUBLIC$"));
        assert_eq!(layer.get("tables"), Some(".*"));
        assert_eq!(layer.get("title"), Some("Weekly report"));
        assert_eq!(layer.get(COMMAND_KEY), Some("details"));
        assert_eq!(layer.origin(), &ConfigOrigin::CommandLine);
    }

    #[test]
    fn test_switch_does_not_swallow_command() {
        let layer = tokenize(&args(&["-invert-match", "list", "-only-matching=false"])).unwrap();

        assert!(layer.contains("invert-match"));
        assert_eq!(layer.get("invert-match"), None);
        assert_eq!(layer.get("only-matching"), Some("false"));
        assert_eq!(layer.get(COMMAND_KEY), Some("list"));
    }

    #[test]
    fn test_empty_value_is_kept() {
        let layer = tokenize(&args(&["-tabletypes", "", "-i", "maximum"])).unwrap();
        assert!(layer.contains("tabletypes"));
        assert_eq!(layer.get("tabletypes"), Some(""));
        assert_eq!(layer.get("i"), Some("maximum"));
    }

    #[test]
    fn test_flag_followed_by_flag_has_no_value() {
        let layer = tokenize(&args(&["-title", "-schemas", "S"])).unwrap();
        assert!(layer.contains("title"));
        assert_eq!(layer.get("title"), None);
        assert_eq!(layer.get("schemas"), Some("S"));
    }

    #[test]
    fn test_negative_value_needs_equals() {
        let layer = tokenize(&args(&["-grep-def=-- audit"])).unwrap();
        assert_eq!(layer.get("grep-def"), Some("-- audit"));
    }

    #[test]
    fn test_two_commands_rejected() {
        let error = tokenize(&args(&["list", "details"])).unwrap_err();
        assert!(matches!(error, CrawlError::CommandLine { .. }));
        assert!(error.to_string().contains("'list'"));

        let error = tokenize(&args(&["-command", "list", "details"])).unwrap_err();
        assert!(matches!(error, CrawlError::CommandLine { .. }));
    }

    #[test]
    fn test_lone_dash_rejected() {
        assert!(tokenize(&args(&["-"])).is_err());
        assert!(tokenize(&args(&["--"])).is_err());
        assert!(tokenize(&args(&["-=value"])).is_err());
    }

    #[test]
    fn test_misplaced_binary_switch_rejected() {
        let error = tokenize(&args(&["-server", "sqlite", "list", "--verbose"])).unwrap_err();
        assert!(matches!(error, CrawlError::CommandLine { .. }));
        assert!(error.to_string().contains("--verbose"));

        assert!(tokenize(&args(&["-quiet", "list"])).is_err());
        assert!(tokenize(&args(&["--list-connectors"])).is_err());
    }

    #[test]
    fn test_find_value() {
        let raw = args(&[
            "-invert-match",
            "-url",
            "postgresql://localhost/crm",
            "-server=mysql",
            "list",
        ]);
        assert_eq!(find_value(&raw, &["url"]), Some("postgresql://localhost/crm"));
        assert_eq!(find_value(&raw, &["server"]), Some("mysql"));
        assert_eq!(find_value(&raw, &["database"]), None);
    }

    #[test]
    fn test_find_value_skips_other_values() {
        let raw = args(&["-title", "server", "-server", "sqlite"]);
        assert_eq!(find_value(&raw, &["server"]), Some("sqlite"));
    }
}
