//! Findings produced by the detector and the matching engine.
//!
//! - [`NamingIssue`] - an immutable, single-location naming or shape problem
//! - [`CodePattern`] - a named pattern whose occurrence count accumulates
//! - [`CompatibilityRecord`] - the result of matching two inventories

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::location::SourceLocation;

/// How serious a finding is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic.
    Low,
    /// Worth fixing.
    #[default]
    Medium,
    /// Likely to break an integration.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A naming or shape issue. Produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingIssue {
    /// Issue type tag, e.g. `"mixed_url_naming"`.
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Where the issue was observed, when a single place can be named.
    pub location: Option<SourceLocation>,
    /// Severity.
    pub severity: Severity,
    /// Suggested fix.
    pub suggestion: Option<String>,
}

/// The category of a [`CodePattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// Something done well.
    BestPractice,
    /// A maintainability hazard.
    AntiPattern,
    /// A security hazard.
    Security,
    /// A performance hazard.
    Performance,
}

/// A named code pattern with an accumulating occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePattern {
    /// Pattern name; identity within a [`PatternRegistry`].
    pub name: String,
    /// Category.
    pub category: PatternCategory,
    /// Description from the first recording.
    pub description: String,
    /// Number of times the pattern was observed.
    pub occurrences: u32,
    /// Where the pattern was observed.
    pub locations: BTreeSet<SourceLocation>,
    /// Severity.
    pub severity: Severity,
}

impl CodePattern {
    /// Creates a pattern observation with the given occurrence count.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: PatternCategory,
        description: impl Into<String>,
        severity: Severity,
        occurrences: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            description: description.into(),
            occurrences,
            locations: BTreeSet::new(),
            severity,
        }
    }

    /// Adds locations to this observation.
    #[must_use]
    pub fn at(mut self, locations: impl IntoIterator<Item = SourceLocation>) -> Self {
        self.locations.extend(locations);
        self
    }
}

/// Code patterns keyed by name.
///
/// Recording a pattern whose name is already present adds its occurrences and
/// locations to the existing entry instead of creating a second one.
///
/// # Examples
///
/// ```
/// use xc_core::{CodePattern, PatternCategory, PatternRegistry, Severity};
///
/// let mut patterns = PatternRegistry::default();
/// patterns.record(CodePattern::new("large_component", PatternCategory::AntiPattern, "", Severity::Medium, 1));
/// patterns.record(CodePattern::new("large_component", PatternCategory::AntiPattern, "", Severity::Medium, 1));
/// assert_eq!(patterns.get("large_component").map(|p| p.occurrences), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternRegistry {
    patterns: BTreeMap<String, CodePattern>,
}

impl PatternRegistry {
    /// Records an observation, accumulating by name.
    pub fn record(&mut self, pattern: CodePattern) {
        match self.patterns.get_mut(&pattern.name) {
            Some(existing) => {
                existing.occurrences += pattern.occurrences;
                existing.locations.extend(pattern.locations);
                existing.severity = existing.severity.max(pattern.severity);
            }
            None => {
                self.patterns.insert(pattern.name.clone(), pattern);
            }
        }
    }

    /// Looks a pattern up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CodePattern> {
        self.patterns.get(name)
    }

    /// Iterates patterns in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CodePattern> {
        self.patterns.values()
    }

    /// Returns the number of distinct patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if no pattern was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// A model matched in the counterpart inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMatch {
    /// Name of the counterpart model.
    pub matched: String,
    /// Jaccard similarity of the field-name sets.
    pub similarity: f64,
}

/// An endpoint matched in the counterpart inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointMatch {
    /// URL of the counterpart endpoint.
    pub matched_url: String,
    /// Match quality in `[0, 1]`.
    pub similarity: f64,
}

/// The result of matching a usage inventory (A) against a declaration
/// inventory (B).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRecord {
    /// A model name to its match in B.
    pub model_matches: BTreeMap<String, ModelMatch>,
    /// A models with no counterpart in B.
    pub models_missing: BTreeSet<String>,
    /// B models no A model matched.
    pub models_only_in_b: BTreeSet<String>,
    /// `"METHOD url"` of an A endpoint to its match in B.
    pub endpoint_matches: BTreeMap<String, EndpointMatch>,
    /// `"METHOD url"` of A endpoints with no counterpart.
    pub endpoints_only_in_a: BTreeSet<String>,
    /// `"METHOD url"` of B endpoints no A endpoint matched.
    pub endpoints_only_in_b: BTreeSet<String>,
}

impl CompatibilityRecord {
    /// Fraction of A endpoints that found a counterpart, or `1.0` when A has
    /// none.
    #[must_use]
    pub fn endpoint_coverage(&self) -> f64 {
        let total = self.endpoint_matches.len() + self.endpoints_only_in_a.len();
        if total == 0 {
            return 1.0;
        }
        self.endpoint_matches.len() as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_registry_accumulates_by_name() {
        let mut patterns = PatternRegistry::default();
        patterns.record(
            CodePattern::new("inconsistent_api_design", PatternCategory::AntiPattern, "a", Severity::Medium, 3)
                .at([SourceLocation::new("a.ts", 1)]),
        );
        patterns.record(
            CodePattern::new("inconsistent_api_design", PatternCategory::AntiPattern, "b", Severity::High, 2)
                .at([SourceLocation::new("b.ts", 4)]),
        );

        assert_eq!(patterns.len(), 1);
        let pattern = patterns.get("inconsistent_api_design").unwrap();
        assert_eq!(pattern.occurrences, 5);
        assert_eq!(pattern.locations.len(), 2);
        assert_eq!(pattern.description, "a");
        assert_eq!(pattern.severity, Severity::High);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn test_endpoint_coverage() {
        let mut record = CompatibilityRecord::default();
        assert!((record.endpoint_coverage() - 1.0).abs() < f64::EPSILON);

        record.endpoint_matches.insert(
            "GET /a/".to_owned(),
            EndpointMatch {
                matched_url: "/a/".to_owned(),
                similarity: 1.0,
            },
        );
        record.endpoints_only_in_a.insert("GET /b/".to_owned());
        assert!((record.endpoint_coverage() - 0.5).abs() < f64::EPSILON);
    }
}
