//! The assembled output of an analysis run.
//!
//! [`AnalysisReport`] serializes to nested maps and lists with every set
//! rendered as a sorted list. [`AnalysisReport::render_text`] gives a short
//! human-readable summary.

use std::fmt::Write;

use camino::Utf8PathBuf;
use serde::Serialize;
use xc_core::{CompatibilityRecord, NamingIssue, PatternRegistry};
use xc_scanner::{Inventory, RunStatsSnapshot, ScanResult};

use crate::graph::RelationshipGraph;

/// What was extracted from one codebase.
#[derive(Debug, Serialize)]
pub struct SideReport {
    /// Root directory that was scanned.
    pub root: Utf8PathBuf,
    /// Name of the extraction rule preset.
    pub rules: String,
    /// Run statistics.
    pub stats: RunStatsSnapshot,
    /// Files that could not be extracted.
    pub error_files: Vec<Utf8PathBuf>,
    /// Extracted entities.
    pub inventory: Inventory,
}

impl SideReport {
    /// Builds a side report from a finished scan.
    #[must_use]
    pub fn from_scan(root: Utf8PathBuf, rules: impl Into<String>, result: ScanResult) -> Self {
        let error_files = result.error_files().map(ToOwned::to_owned).collect();
        Self {
            root,
            rules: rules.into(),
            stats: result.stats,
            error_files,
            inventory: result.inventory,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    /// The usage codebase (A).
    pub usage: SideReport,
    /// The declaration codebase (B), when one was supplied.
    pub declaration: Option<SideReport>,
    /// Naming and shape issues from both sides.
    pub naming_issues: Vec<NamingIssue>,
    /// Code patterns from both sides.
    pub patterns: PatternRegistry,
    /// Relationship graph over the usage inventory.
    pub graph: RelationshipGraph,
    /// Match of A against B, when B was supplied.
    pub compatibility: Option<CompatibilityRecord>,
}

impl AnalysisReport {
    /// Renders a plain-text summary.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        render_side(&mut out, "Usage", &self.usage);
        if let Some(declaration) = &self.declaration {
            render_side(&mut out, "Declaration", declaration);
        }
        let _ = writeln!(
            out,
            "Graph: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );

        if let Some(record) = &self.compatibility {
            render_compatibility(&mut out, record);
        }

        if !self.patterns.is_empty() {
            let _ = writeln!(out, "\nPatterns");
            for pattern in self.patterns.iter() {
                let _ = writeln!(
                    out,
                    "  [{}] {} x{}: {}",
                    pattern.severity, pattern.name, pattern.occurrences, pattern.description
                );
            }
        }

        if !self.naming_issues.is_empty() {
            let _ = writeln!(out, "\nIssues");
            for issue in &self.naming_issues {
                let _ = write!(out, "  [{}] {}: {}", issue.severity, issue.kind, issue.description);
                if let Some(location) = &issue.location {
                    let _ = write!(out, " ({location})");
                }
                out.push('\n');
            }
        }
        out
    }
}

fn render_side(out: &mut String, title: &str, side: &SideReport) {
    let stats = &side.stats;
    let _ = writeln!(out, "{title}: {} ({})", side.root, side.rules);
    let _ = writeln!(
        out,
        "  files: {} processed, {} errors, {} parse errors, {} parse timeouts, {} cache hits",
        stats.processed, stats.error_files, stats.parse_errors, stats.parse_timeouts, stats.cache_hits
    );
    let _ = writeln!(
        out,
        "  entities: {} endpoints, {} models, {} components",
        side.inventory.endpoint_count(),
        side.inventory.model_count(),
        side.inventory.component_count()
    );
}

fn render_compatibility(out: &mut String, record: &CompatibilityRecord) {
    let _ = writeln!(
        out,
        "\nCompatibility (endpoint coverage {:.1}%)",
        record.endpoint_coverage() * 100.0
    );
    for (endpoint, found) in &record.endpoint_matches {
        let _ = writeln!(out, "  {endpoint} -> {} ({:.2})", found.matched_url, found.similarity);
    }
    for endpoint in &record.endpoints_only_in_a {
        let _ = writeln!(out, "  {endpoint} -> missing in declaration");
    }
    for endpoint in &record.endpoints_only_in_b {
        let _ = writeln!(out, "  {endpoint} -> never called");
    }
    for (model, found) in &record.model_matches {
        let _ = writeln!(out, "  model {model} -> {} ({:.2})", found.matched, found.similarity);
    }
    for model in &record.models_missing {
        let _ = writeln!(out, "  model {model} -> missing in declaration");
    }
    for model in &record.models_only_in_b {
        let _ = writeln!(out, "  model {model} -> never used");
    }
}
