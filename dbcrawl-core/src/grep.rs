//! Content-level "grep" filtering with invert and only-matching modifiers.
//!
//! A grep rule looks at the sub-elements of an object (the columns of a
//! table, the parameters of a routine, the lines of a definition) rather than
//! at the object's own name. Two modifiers change its behavior
//! independently:
//!
//! - `invert_match` flips whether a sub-element counts as a hit.
//! - `only_matching` restricts the *displayed* sub-elements of an accepted
//!   object to the hits. It never changes which objects are accepted.

use crate::inclusion::InclusionRule;
use serde::Serialize;

/// An inclusion rule applied to sub-elements, plus the two grep modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrepRule {
    rule: InclusionRule,
    invert_match: bool,
    only_matching: bool,
}

impl GrepRule {
    /// Creates a grep rule from its parts.
    pub fn new(rule: InclusionRule, invert_match: bool, only_matching: bool) -> Self {
        Self {
            rule,
            invert_match,
            only_matching,
        }
    }

    /// The underlying inclusion rule.
    pub fn rule(&self) -> &InclusionRule {
        &self.rule
    }

    /// Whether hits are inverted.
    pub fn invert_match(&self) -> bool {
        self.invert_match
    }

    /// Whether only hits are displayed.
    pub fn only_matching(&self) -> bool {
        self.only_matching
    }

    /// A single sub-element counts as a hit when the rule matches it,
    /// or, with `invert_match`, when it does not.
    pub fn is_hit(&self, element: &str) -> bool {
        self.rule.matches(element) != self.invert_match
    }

    /// An object is accepted when at least one of its sub-elements is a hit.
    pub fn accepts<'a, I>(&self, elements: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        elements.into_iter().any(|element| self.is_hit(element))
    }

    /// Sub-elements to display for an object.
    ///
    /// Rejected objects display nothing. Accepted objects display every
    /// sub-element, or only the hits when `only_matching` is set.
    pub fn displayed<'a>(&self, elements: &[&'a str]) -> Vec<&'a str> {
        if !self.accepts(elements.iter().copied()) {
            return Vec::new();
        }
        elements
            .iter()
            .copied()
            .filter(|element| !self.only_matching || self.is_hit(element))
            .collect()
    }
}
