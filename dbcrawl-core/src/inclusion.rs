//! Inclusion rules built from textual patterns.
//!
//! An [`InclusionRule`] decides whether a named schema object (schema, table,
//! column, routine, ...) takes part in the crawl. Patterns are regular
//! expressions matched against the whole name, never as a substring search.
//!
//! Rules are immutable: composing a rule with a new include or exclude half
//! produces a new value and leaves the original untouched, so a rule can be
//! assembled from two separate configuration reads and shared freely across
//! threads once built.
//!
//! # Example
//! ```rust
//! use dbcrawl_core::inclusion::InclusionRule;
//!
//! let rule = InclusionRule::build(Some("PUBLIC|SALES"), Some("SALES"))?;
//! assert!(rule.matches("PUBLIC"));
//! assert!(!rule.matches("SALES"));
//! assert!(!rule.matches("PUBLIC_ARCHIVE"));
//! # Ok::<(), dbcrawl_core::inclusion::PatternError>(())
//! ```

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A pattern that failed to compile.
#[derive(Debug, Error)]
#[error("invalid regular expression '{pattern}': {source}")]
pub struct PatternError {
    /// The pattern as supplied by the user
    pub pattern: String,
    #[source]
    source: regex::Error,
}

/// A compiled, whole-string regular expression that remembers its source.
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` anchored at both ends. Blank patterns yield `None`.
    ///
    /// The raw pattern must compile on its own first, otherwise an unbalanced
    /// `)` could close the anchoring group.
    fn compile(source: &str) -> Result<Option<Self>, PatternError> {
        if source.trim().is_empty() {
            return Ok(None);
        }
        let invalid = |e: regex::Error| PatternError {
            pattern: source.to_string(),
            source: e,
        };
        Regex::new(source).map_err(invalid)?;
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(invalid)?;
        Ok(Some(Self {
            source: source.to_string(),
            regex,
        }))
    }

    fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Include/exclude predicate over object names.
///
/// A candidate matches iff the include pattern is absent or matches, and the
/// exclude pattern is absent or does not match. The default rule has neither
/// pattern and matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InclusionRule {
    include: Option<Pattern>,
    exclude: Option<Pattern>,
}

impl InclusionRule {
    /// Rule that accepts every name.
    pub fn include_all() -> Self {
        Self::default()
    }

    /// Builds a rule from optional include and exclude patterns.
    ///
    /// # Errors
    /// Returns [`PatternError`] naming the first pattern that does not
    /// compile.
    pub fn build(include: Option<&str>, exclude: Option<&str>) -> Result<Self, PatternError> {
        Ok(Self {
            include: include.map(Pattern::compile).transpose()?.flatten(),
            exclude: exclude.map(Pattern::compile).transpose()?.flatten(),
        })
    }

    /// Returns a copy of this rule with its include half replaced.
    ///
    /// # Errors
    /// Returns [`PatternError`] if `pattern` does not compile.
    pub fn with_include(&self, pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            include: Pattern::compile(pattern)?,
            exclude: self.exclude.clone(),
        })
    }

    /// Returns a copy of this rule with its exclude half replaced.
    ///
    /// # Errors
    /// Returns [`PatternError`] if `pattern` does not compile.
    pub fn with_exclude(&self, pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            include: self.include.clone(),
            exclude: Pattern::compile(pattern)?,
        })
    }

    /// Tests a candidate name against the rule.
    pub fn matches(&self, candidate: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(candidate));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(candidate));
        included && !excluded
    }

    /// Source of the include pattern, if any.
    pub fn include_pattern(&self) -> Option<&str> {
        self.include.as_ref().map(|p| p.source.as_str())
    }

    /// Source of the exclude pattern, if any.
    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(|p| p.source.as_str())
    }

    /// True when the rule has no patterns and therefore accepts every name.
    pub fn is_include_all(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

impl fmt::Display for InclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InclusionRule[include={}, exclude={}]",
            self.include_pattern().unwrap_or(".*"),
            self.exclude_pattern().unwrap_or("<none>")
        )
    }
}
