//! Schema info levels and the retrieval flags they expand to.
//!
//! An [`InfoLevel`] is a named, ordered bundle of boolean retrieval flags.
//! A [`SchemaInfoLevel`] pairs a level with explicit per-flag overrides: an
//! explicitly set flag always wins over the level-derived default for that
//! one flag only.

use crate::config::{ConfigEnum, LayeredConfig};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Named retrieval depth, ordered from least to most detailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoLevel {
    /// Names and structure only
    Minimum,
    /// Common metadata, the default
    #[default]
    Standard,
    /// Adds constraints, triggers and definitions
    Detailed,
    /// Everything the connector can retrieve
    Maximum,
    /// Base level meant to be completed with explicit flags
    Custom,
}

impl InfoLevel {
    /// Level used to compute flag defaults. `custom` starts from `minimum`.
    fn effective(self) -> Self {
        match self {
            Self::Custom => Self::Minimum,
            other => other,
        }
    }
}

impl ConfigEnum for InfoLevel {
    const TOKENS: &'static [&'static str] = &["minimum", "standard", "detailed", "maximum", "custom"];

    fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "minimum" => Some(Self::Minimum),
            "standard" => Some(Self::Standard),
            "detailed" => Some(Self::Detailed),
            "maximum" => Some(Self::Maximum),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for InfoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Custom => "custom",
            Self::Minimum => "minimum",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Maximum => "maximum",
        };
        f.write_str(name)
    }
}

/// A single boolean retrieval flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalFlag {
    /// Database product name and version
    RetrieveDatabaseInfo,
    /// Columns of each table
    RetrieveTableColumns,
    /// Procedures and functions
    RetrieveRoutines,
    /// Table type names
    RetrieveTableTypes,
    /// Column data types
    RetrieveColumnDataTypes,
    /// Indexes
    RetrieveIndexes,
    /// Foreign keys
    RetrieveForeignKeys,
    /// Primary keys
    RetrievePrimaryKeys,
    /// Routine parameters
    RetrieveRoutineParameters,
    /// View definitions
    RetrieveViewInformation,
    /// Check and unique constraints
    RetrieveTableConstraints,
    /// Triggers
    RetrieveTriggers,
    /// Routine source text
    RetrieveRoutineDefinitions,
    /// Sequences
    RetrieveSequences,
    /// Synonyms
    RetrieveSynonyms,
    /// Connector-specific table attributes
    RetrieveAdditionalTableAttributes,
    /// Connector-specific column attributes
    RetrieveAdditionalColumnAttributes,
    /// Server properties
    RetrieveServerInfo,
    /// Database users
    RetrieveDatabaseUsers,
}

impl RetrievalFlag {
    /// Every flag, in a fixed order.
    pub const ALL: [Self; 19] = [
        Self::RetrieveDatabaseInfo,
        Self::RetrieveTableColumns,
        Self::RetrieveRoutines,
        Self::RetrieveTableTypes,
        Self::RetrieveColumnDataTypes,
        Self::RetrieveIndexes,
        Self::RetrieveForeignKeys,
        Self::RetrievePrimaryKeys,
        Self::RetrieveRoutineParameters,
        Self::RetrieveViewInformation,
        Self::RetrieveTableConstraints,
        Self::RetrieveTriggers,
        Self::RetrieveRoutineDefinitions,
        Self::RetrieveSequences,
        Self::RetrieveSynonyms,
        Self::RetrieveAdditionalTableAttributes,
        Self::RetrieveAdditionalColumnAttributes,
        Self::RetrieveServerInfo,
        Self::RetrieveDatabaseUsers,
    ];

    /// Lowest level that enables this flag.
    pub fn min_level(self) -> InfoLevel {
        match self {
            Self::RetrieveDatabaseInfo
            | Self::RetrieveTableColumns
            | Self::RetrieveRoutines
            | Self::RetrieveTableTypes => InfoLevel::Minimum,
            Self::RetrieveColumnDataTypes
            | Self::RetrieveIndexes
            | Self::RetrieveForeignKeys
            | Self::RetrievePrimaryKeys
            | Self::RetrieveRoutineParameters
            | Self::RetrieveViewInformation => InfoLevel::Standard,
            Self::RetrieveTableConstraints
            | Self::RetrieveTriggers
            | Self::RetrieveRoutineDefinitions
            | Self::RetrieveSequences
            | Self::RetrieveSynonyms => InfoLevel::Detailed,
            Self::RetrieveAdditionalTableAttributes
            | Self::RetrieveAdditionalColumnAttributes
            | Self::RetrieveServerInfo
            | Self::RetrieveDatabaseUsers => InfoLevel::Maximum,
        }
    }

    /// Flag name as used in configuration keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::RetrieveDatabaseInfo => "retrieve_database_info",
            Self::RetrieveTableColumns => "retrieve_table_columns",
            Self::RetrieveRoutines => "retrieve_routines",
            Self::RetrieveTableTypes => "retrieve_table_types",
            Self::RetrieveColumnDataTypes => "retrieve_column_data_types",
            Self::RetrieveIndexes => "retrieve_indexes",
            Self::RetrieveForeignKeys => "retrieve_foreign_keys",
            Self::RetrievePrimaryKeys => "retrieve_primary_keys",
            Self::RetrieveRoutineParameters => "retrieve_routine_parameters",
            Self::RetrieveViewInformation => "retrieve_view_information",
            Self::RetrieveTableConstraints => "retrieve_table_constraints",
            Self::RetrieveTriggers => "retrieve_triggers",
            Self::RetrieveRoutineDefinitions => "retrieve_routine_definitions",
            Self::RetrieveSequences => "retrieve_sequences",
            Self::RetrieveSynonyms => "retrieve_synonyms",
            Self::RetrieveAdditionalTableAttributes => "retrieve_additional_table_attributes",
            Self::RetrieveAdditionalColumnAttributes => "retrieve_additional_column_attributes",
            Self::RetrieveServerInfo => "retrieve_server_info",
            Self::RetrieveDatabaseUsers => "retrieve_database_users",
        }
    }

    /// Configuration key holding an explicit value for this flag.
    pub fn config_key(self) -> String {
        format!("infolevel.{}", self.name())
    }
}

/// An info level plus explicit flag overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaInfoLevel {
    level: InfoLevel,
    overrides: BTreeMap<RetrievalFlag, bool>,
}

impl SchemaInfoLevel {
    /// The named level.
    pub fn level(&self) -> InfoLevel {
        self.level
    }

    /// Whether a flag is enabled, honoring explicit overrides first.
    pub fn is_enabled(&self, flag: RetrievalFlag) -> bool {
        self.overrides
            .get(&flag)
            .copied()
            .unwrap_or_else(|| flag.min_level() <= self.level.effective())
    }

    /// Every flag with its resolved value.
    pub fn flags(&self) -> BTreeMap<RetrievalFlag, bool> {
        RetrievalFlag::ALL
            .into_iter()
            .map(|flag| (flag, self.is_enabled(flag)))
            .collect()
    }

    /// Flags that were set explicitly.
    pub fn overrides(&self) -> &BTreeMap<RetrievalFlag, bool> {
        &self.overrides
    }
}

/// Builder for [`SchemaInfoLevel`].
#[derive(Debug, Clone, Default)]
pub struct SchemaInfoLevelBuilder {
    level: InfoLevel,
    overrides: BTreeMap<RetrievalFlag, bool>,
}

impl SchemaInfoLevelBuilder {
    /// Creates a builder at the `standard` level with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads explicit `infolevel.<flag>` overrides from configuration and
    /// marks them consumed.
    ///
    /// # Errors
    /// Returns a configuration error if a flag value is not a boolean.
    pub fn from_config(mut self, config: &mut LayeredConfig) -> Result<Self> {
        for flag in RetrievalFlag::ALL {
            let key = flag.config_key();
            if config.has_value(&key) {
                let enabled = config.get_boolean(&key, true)?;
                self.overrides.insert(flag, enabled);
                config.consume(&key);
            }
        }
        Ok(self)
    }

    /// Sets the named level. Explicit overrides are kept.
    pub fn with_info_level(mut self, level: InfoLevel) -> Self {
        self.level = level;
        self
    }

    /// Explicitly sets one flag.
    pub fn with_flag(mut self, flag: RetrievalFlag, enabled: bool) -> Self {
        self.overrides.insert(flag, enabled);
        self
    }

    /// Finalizes the info level.
    pub fn build(self) -> SchemaInfoLevel {
        SchemaInfoLevel {
            level: self.level,
            overrides: self.overrides,
        }
    }
}
