//! File-name exclusion for the partitioner.
//!
//! Distributions bundle third-party components that some deployments do not
//! want on disk. Which ones is deployment-specific, so the rule is a list of
//! case-insensitive substrings supplied by configuration.

use serde::{Deserialize, Serialize};

/// Excludes any file whose name contains one of the configured substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    patterns: Vec<String>,
}

impl ExclusionRule {
    /// A rule that excludes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a rule from substrings. Empty patterns are dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list, e.g. `discord,overlay`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// The normalised patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `name` should be skipped.
    pub fn matches(&self, name: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = name.to_ascii_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}
