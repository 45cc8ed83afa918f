//! Crawl options: mutable while parsing, frozen into an immutable snapshot.
//!
//! Option parsers mutate a [`CrawlOptionsBuilder`]; once every parser has
//! run the session calls [`CrawlOptionsBuilder::build`] and hands the
//! resulting [`CrawlOptions`] to execution. Snapshots compare equal when they
//! were parsed from identical arguments.

use crate::grep::GrepRule;
use crate::inclusion::InclusionRule;
use crate::info_level::{SchemaInfoLevel, SchemaInfoLevelBuilder};
use serde::Serialize;
use std::path::PathBuf;

/// Table types retrieved when `-tabletypes` is not given.
pub const DEFAULT_TABLE_TYPES: &str = "TABLE,VIEW";

/// Routine types retrieved when `-routinetypes` is not given.
pub const DEFAULT_ROUTINE_TYPES: &str = "PROCEDURE,FUNCTION";

/// Splits a comma-separated type list. A blank list means "no filter".
pub fn parse_type_list(list: &str) -> Option<Vec<String>> {
    let tokens: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    if tokens.is_empty() { None } else { Some(tokens) }
}

/// Content-level grep settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrepOptions {
    /// Match on column definitions; `None` disables the filter
    pub columns: Option<InclusionRule>,
    /// Match on routine parameters; `None` disables the filter
    pub routine_columns: Option<InclusionRule>,
    /// Match on free-text definitions; `None` disables the filter
    pub definitions: Option<InclusionRule>,
    /// Flip grep accept/reject
    pub invert_match: bool,
    /// Display only matching sub-elements
    pub only_matching: bool,
}

impl GrepOptions {
    /// Whether any grep filter is enabled.
    pub fn is_enabled(&self) -> bool {
        self.columns.is_some() || self.routine_columns.is_some() || self.definitions.is_some()
    }

    fn grep(&self, rule: Option<&InclusionRule>) -> Option<GrepRule> {
        rule.map(|rule| GrepRule::new(rule.clone(), self.invert_match, self.only_matching))
    }

    /// Grep rule for column definitions.
    pub fn column_rule(&self) -> Option<GrepRule> {
        self.grep(self.columns.as_ref())
    }

    /// Grep rule for routine parameters.
    pub fn routine_column_rule(&self) -> Option<GrepRule> {
        self.grep(self.routine_columns.as_ref())
    }

    /// Grep rule for free-text definitions.
    pub fn definition_rule(&self) -> Option<GrepRule> {
        self.grep(self.definitions.as_ref())
    }
}

/// Immutable options snapshot consumed by execution and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlOptions {
    /// Report title
    pub title: String,
    /// Retrieval depth
    pub info_level: SchemaInfoLevel,
    /// Schema-name inclusion
    pub schemas: InclusionRule,
    /// Table-name inclusion
    pub tables: InclusionRule,
    /// Column-name rule (exclude-only)
    pub columns: InclusionRule,
    /// Routine-name inclusion
    pub routines: InclusionRule,
    /// Routine-parameter rule (exclude-only)
    pub routine_columns: InclusionRule,
    /// Synonym-name inclusion
    pub synonyms: InclusionRule,
    /// Sequence-name inclusion
    pub sequences: InclusionRule,
    /// Table types to retrieve; `None` means no filter
    pub table_types: Option<Vec<String>>,
    /// Routine types to retrieve; `None` means no filter
    pub routine_types: Option<Vec<String>>,
    /// Content-level grep settings
    pub grep: GrepOptions,
    /// Generations of parent tables pulled in by relationship
    pub parent_table_depth: u32,
    /// Generations of child tables pulled in by relationship
    pub child_table_depth: u32,
    /// Drop tables without rows
    pub no_empty_tables: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            info_level: SchemaInfoLevel::default(),
            schemas: InclusionRule::default(),
            tables: InclusionRule::default(),
            columns: InclusionRule::default(),
            routines: InclusionRule::default(),
            routine_columns: InclusionRule::default(),
            synonyms: InclusionRule::default(),
            sequences: InclusionRule::default(),
            table_types: parse_type_list(DEFAULT_TABLE_TYPES),
            routine_types: parse_type_list(DEFAULT_ROUTINE_TYPES),
            grep: GrepOptions::default(),
            parent_table_depth: 0,
            child_table_depth: 0,
            no_empty_tables: false,
        }
    }
}

/// Mutable builder for [`CrawlOptions`], used only while parsing.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptionsBuilder {
    options: CrawlOptions,
    info_level: SchemaInfoLevelBuilder,
}

impl CrawlOptionsBuilder {
    /// Creates a builder holding the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current options, for reading back partially parsed values.
    pub fn current(&self) -> &CrawlOptions {
        &self.options
    }

    /// Sets the report title.
    pub fn title(&mut self, title: String) -> &mut Self {
        self.options.title = title;
        self
    }

    /// Replaces the info level builder.
    pub fn with_schema_info_level(&mut self, info_level: SchemaInfoLevelBuilder) -> &mut Self {
        self.info_level = info_level;
        self
    }

    /// Sets the schema inclusion rule.
    pub fn include_schemas(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.schemas = rule;
        self
    }

    /// Sets the table inclusion rule.
    pub fn include_tables(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.tables = rule;
        self
    }

    /// Sets the column rule.
    pub fn include_columns(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.columns = rule;
        self
    }

    /// Sets the routine inclusion rule.
    pub fn include_routines(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.routines = rule;
        self
    }

    /// Sets the routine parameter rule.
    pub fn include_routine_columns(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.routine_columns = rule;
        self
    }

    /// Sets the synonym inclusion rule.
    pub fn include_synonyms(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.synonyms = rule;
        self
    }

    /// Sets the sequence inclusion rule.
    pub fn include_sequences(&mut self, rule: InclusionRule) -> &mut Self {
        self.options.sequences = rule;
        self
    }

    /// Sets the table types; `None` clears the filter.
    pub fn table_types(&mut self, types: Option<Vec<String>>) -> &mut Self {
        self.options.table_types = types;
        self
    }

    /// Sets the routine types; `None` clears the filter.
    pub fn routine_types(&mut self, types: Option<Vec<String>>) -> &mut Self {
        self.options.routine_types = types;
        self
    }

    /// Sets the column grep rule; `None` disables it.
    pub fn include_grepped_columns(&mut self, rule: Option<InclusionRule>) -> &mut Self {
        self.options.grep.columns = rule;
        self
    }

    /// Sets the routine parameter grep rule; `None` disables it.
    pub fn include_grepped_routine_columns(&mut self, rule: Option<InclusionRule>) -> &mut Self {
        self.options.grep.routine_columns = rule;
        self
    }

    /// Sets the definition grep rule; `None` disables it.
    pub fn include_grepped_definitions(&mut self, rule: Option<InclusionRule>) -> &mut Self {
        self.options.grep.definitions = rule;
        self
    }

    /// Sets the invert-match modifier.
    pub fn invert_grep_match(&mut self, invert: bool) -> &mut Self {
        self.options.grep.invert_match = invert;
        self
    }

    /// Sets the only-matching modifier.
    pub fn grep_only_matching(&mut self, only_matching: bool) -> &mut Self {
        self.options.grep.only_matching = only_matching;
        self
    }

    /// Sets the parent table depth.
    pub fn parent_table_depth(&mut self, depth: u32) -> &mut Self {
        self.options.parent_table_depth = depth;
        self
    }

    /// Sets the child table depth.
    pub fn child_table_depth(&mut self, depth: u32) -> &mut Self {
        self.options.child_table_depth = depth;
        self
    }

    /// Sets the empty-table filter.
    pub fn no_empty_tables(&mut self, enabled: bool) -> &mut Self {
        self.options.no_empty_tables = enabled;
        self
    }

    /// Freezes the builder into a snapshot.
    pub fn build(self) -> CrawlOptions {
        CrawlOptions {
            info_level: self.info_level.build(),
            ..self.options
        }
    }
}

/// Output settings handed through to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputOptions {
    /// Output format token, interpreted by the executor
    pub format: String,
    /// Output file; `None` writes to standard output
    pub output_file: Option<PathBuf>,
    /// Encoding for reading input resources
    pub input_encoding: String,
    /// Encoding for writing output
    pub output_encoding: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            output_file: None,
            input_encoding: "UTF-8".to_string(),
            output_encoding: "UTF-8".to_string(),
        }
    }
}
