use super::{OptionGroupParser, ParseState, read_switch};
use crate::config::LayeredConfig;
use crate::error::Result;
use crate::observer::SessionObserver;

/// Relationship depth and empty-table filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptionsParser;

impl OptionGroupParser for FilterOptionsParser {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        _observer: &dyn SessionObserver,
    ) -> Result<()> {
        if config.has_value("parents") {
            state.options.parent_table_depth(config.get_integer("parents", 0)?);
            config.consume("parents");
        }
        if config.has_value("children") {
            state.options.child_table_depth(config.get_integer("children", 0)?);
            config.consume("children");
        }
        if let Some(enabled) = read_switch(config, "noemptytables")? {
            state.options.no_empty_tables(enabled);
            config.consume("noemptytables");
        }
        Ok(())
    }
}
