//! Crawl options: title, info level, name filters, type filters and grep.

use super::{AliasTable, OptionGroupParser, ParseState, notice_override, read_switch};
use crate::config::LayeredConfig;
use crate::error::Result;
use crate::inclusion::InclusionRule;
use crate::info_level::{InfoLevel, SchemaInfoLevelBuilder};
use crate::observer::{Notice, SessionObserver};
use crate::options::{CrawlOptionsBuilder, parse_type_list};

type RuleSetter = fn(&mut CrawlOptionsBuilder, InclusionRule) -> &mut CrawlOptionsBuilder;

/// Name filters read as include patterns.
const NAME_FILTERS: &[(&str, RuleSetter)] = &[
    ("schemas", CrawlOptionsBuilder::include_schemas),
    ("tables", CrawlOptionsBuilder::include_tables),
    ("routines", CrawlOptionsBuilder::include_routines),
    ("synonyms", CrawlOptionsBuilder::include_synonyms),
    ("sequences", CrawlOptionsBuilder::include_sequences),
];

/// Reads the crawl option table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptionsParser;

impl OptionGroupParser for CrawlOptionsParser {
    fn name(&self) -> &'static str {
        "crawl"
    }

    fn aliases(&self) -> AliasTable {
        &[("infolevel", &["i"])]
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        observer: &dyn SessionObserver,
    ) -> Result<()> {
        let builder = &mut state.options;

        if config.has_value("title") {
            builder.title(config.get_string("title", ""));
            config.consume("title");
        }

        let level = config.get_enum("infolevel", InfoLevel::Standard)?;
        config.consume("infolevel");
        let info_level = SchemaInfoLevelBuilder::new()
            .with_info_level(level)
            .from_config(config)?;
        builder.with_schema_info_level(info_level);

        for (key, set_rule) in NAME_FILTERS {
            if config.has_value(key) {
                let current = current_rule(builder, key);
                let rule = config.get_inclusion_rule(key, &current)?;
                notice_override(config, key, observer);
                set_rule(&mut *builder, rule);
                config.consume(key);
            } else if *key == "schemas" {
                observer.on_notice(&Notice::MissingRecommended {
                    key: "schemas".to_string(),
                    advice: "consider limiting the crawl to the schemas you need".to_string(),
                });
            }
        }

        if config.has_value("excludecolumns") {
            let rule = config.get_exclusion_rule("excludecolumns", &builder.current().columns)?;
            notice_override(config, "excludecolumns", observer);
            builder.include_columns(rule);
            config.consume("excludecolumns");
        }
        if config.has_value("excludeinout") {
            let rule =
                config.get_exclusion_rule("excludeinout", &builder.current().routine_columns)?;
            notice_override(config, "excludeinout", observer);
            builder.include_routine_columns(rule);
            config.consume("excludeinout");
        }

        if config.has_value("tabletypes") {
            builder.table_types(parse_type_list(&config.get_string("tabletypes", "")));
            config.consume("tabletypes");
        }
        if config.has_value("routinetypes") {
            builder.routine_types(parse_type_list(&config.get_string("routinetypes", "")));
            config.consume("routinetypes");
        }

        if let Some(invert) = read_switch(config, "invert-match")? {
            builder.invert_grep_match(invert);
            config.consume("invert-match");
        }
        if let Some(only_matching) = read_switch(config, "only-matching")? {
            builder.grep_only_matching(only_matching);
            config.consume("only-matching");
        }

        builder.include_grepped_columns(grep_rule(config, "grep-columns", observer)?);
        builder.include_grepped_routine_columns(grep_rule(config, "grep-inout", observer)?);
        builder.include_grepped_definitions(grep_rule(config, "grep-def", observer)?);

        Ok(())
    }
}

fn current_rule(builder: &CrawlOptionsBuilder, key: &str) -> InclusionRule {
    let current = builder.current();
    match key {
        "schemas" => current.schemas.clone(),
        "tables" => current.tables.clone(),
        "routines" => current.routines.clone(),
        "synonyms" => current.synonyms.clone(),
        "sequences" => current.sequences.clone(),
        _ => InclusionRule::default(),
    }
}

/// A grep filter is disabled unless its key is present.
fn grep_rule(
    config: &mut LayeredConfig,
    key: &str,
    observer: &dyn SessionObserver,
) -> Result<Option<InclusionRule>> {
    if !config.has_value(key) {
        return Ok(None);
    }
    let rule = config.get_inclusion_rule(key, &InclusionRule::default())?;
    notice_override(config, key, observer);
    config.consume(key);
    Ok(Some(rule))
}
