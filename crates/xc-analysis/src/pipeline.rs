//! End-to-end analysis of one or two codebases.
//!
//! ```text
//! usage root ──Scanner──▶ Inventory A ──┬─▶ RelationshipGraph
//!                                       ├─▶ PatternDetector ──┐
//! declaration root ──Scanner──▶ B ──────┼─▶ PatternDetector ──┼─▶ AnalysisReport
//!                                       └─▶ match A vs B ─────┘
//! ```

use camino::Utf8Path;
use tracing::info;
use xc_core::Config;
use xc_scanner::{ScanConfig, Scanner};
use xc_ts_parser::ExtractionRules;

use crate::detector::PatternDetector;
use crate::error::AnalysisError;
use crate::graph::RelationshipGraph;
use crate::matching::match_inventories;
use crate::report::{AnalysisReport, SideReport};

/// Runs scans, graph building, detection and matching with one
/// configuration.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use xc_analysis::Analyzer;
/// use xc_core::Config;
///
/// let analyzer = Analyzer::new(Config::default())?;
/// let report = analyzer.analyze(Utf8Path::new("./web"), Some(Utf8Path::new("./server")))?;
/// print!("{}", report.render_text());
/// # Ok::<(), xc_analysis::AnalysisError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: Config,
    follow_links: bool,
}

impl Analyzer {
    /// Creates an analyzer after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if an option is invalid.
    pub fn new(config: Config) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            follow_links: false,
        })
    }

    /// Configures whether scans follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Scans one side.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Scan`] if the root is invalid or the scan
    /// cannot run.
    pub fn scan(
        &self,
        root: &Utf8Path,
        rules: ExtractionRules,
        side: &'static str,
    ) -> Result<SideReport, AnalysisError> {
        let rules_name = rules.name.clone();
        let config = ScanConfig::new(root, rules)
            .with_analyzer(self.config.analyzer.clone())
            .with_follow_links(self.follow_links);
        let result = Scanner::new(config)
            .and_then(|scanner| scanner.scan())
            .map_err(|e| AnalysisError::scan(side, e))?;
        Ok(SideReport::from_scan(root.to_owned(), rules_name, result))
    }

    /// Analyzes a usage codebase and, optionally, matches it against a
    /// declaration codebase.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Scan`] if either side cannot be scanned and
    /// [`AnalysisError::Pattern`] if a URL cannot be matched.
    pub fn analyze(
        &self,
        usage_root: &Utf8Path,
        declaration_root: Option<&Utf8Path>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let usage = self.scan(usage_root, ExtractionRules::usage(), "usage")?;
        let declaration = declaration_root
            .map(|root| self.scan(root, ExtractionRules::declaration(), "declaration"))
            .transpose()?;
        self.assemble(usage, declaration)
    }

    /// Builds the report from finished scans.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Pattern`] if a URL cannot be matched.
    pub fn assemble(
        &self,
        mut usage: SideReport,
        mut declaration: Option<SideReport>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let graph = RelationshipGraph::build(&mut usage.inventory);
        if let Some(declaration) = declaration.as_mut() {
            // Only registers referencing URLs on the declared models.
            RelationshipGraph::build(&mut declaration.inventory);
        }

        let detector = PatternDetector::new(self.config.detector);
        let mut findings = detector.detect(&usage.inventory);
        if let Some(declaration) = &declaration {
            findings.merge(detector.detect(&declaration.inventory));
        }

        let compatibility = declaration
            .as_ref()
            .map(|declaration| match_inventories(&usage.inventory, &declaration.inventory))
            .transpose()?;

        info!(
            endpoints = usage.inventory.endpoint_count(),
            issues = findings.naming_issues.len(),
            patterns = findings.patterns.len(),
            coverage = compatibility.as_ref().map(|r| r.endpoint_coverage()),
            "Analysis completed"
        );

        Ok(AnalysisReport {
            usage,
            declaration,
            naming_issues: findings.naming_issues,
            patterns: findings.patterns,
            graph,
            compatibility,
        })
    }

    /// Scans a usage codebase and renders the subtree below `component`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownComponent`] if no component has that
    /// name, and [`AnalysisError::Scan`] if the scan fails.
    pub fn tree(&self, usage_root: &Utf8Path, component: &str) -> Result<String, AnalysisError> {
        let mut usage = self.scan(usage_root, ExtractionRules::usage(), "usage")?;
        RelationshipGraph::build(&mut usage.inventory)
            .render_tree(component)
            .ok_or_else(|| AnalysisError::UnknownComponent(component.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use xc_core::AnalyzerConfig;

    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        let config = Config {
            analyzer: AnalyzerConfig {
                max_workers: 0,
                ..AnalyzerConfig::default()
            },
            ..Config::default()
        };
        let err = Analyzer::new(config).unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_missing_root_names_side() {
        let analyzer = Analyzer::new(Config::default()).unwrap();
        let err = analyzer
            .analyze(Utf8Path::new("/nonexistent/xcompat/web"), None)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Scan { side: "usage", .. }));
    }
}
