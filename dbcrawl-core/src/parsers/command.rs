use super::{AliasTable, OptionGroupParser, ParseState};
use crate::config::LayeredConfig;
use crate::config::args::COMMAND_KEY;
use crate::error::{CrawlError, Result};
use crate::observer::SessionObserver;

/// Reads the single command to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandParser;

impl OptionGroupParser for CommandParser {
    fn name(&self) -> &'static str {
        "command"
    }

    fn aliases(&self) -> AliasTable {
        &[(COMMAND_KEY, &["c"])]
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        _observer: &dyn SessionObserver,
    ) -> Result<()> {
        let command = config
            .get(COMMAND_KEY)
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .ok_or_else(|| CrawlError::command_line("no command was specified"))?;
        state.command = Some(command.to_string());
        config.consume(COMMAND_KEY);
        Ok(())
    }
}
