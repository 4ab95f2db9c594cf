//! Filesystem scanner and parallel entity extraction.
//!
//! This crate turns one codebase into an [`Inventory`]: it discovers the
//! JavaScript and TypeScript sources, extracts endpoints, models and
//! components from each with `xc-ts-parser`, and merges the results.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`FileWalker`]: Directory traversal respecting `.gitignore` patterns
//! - [`orchestrator`]: Per-file extraction on a rayon pool, coordinated over a
//!   crossbeam channel
//! - [`ExtractionCache`]: Content-hash cache with `FxHashMap` + `RwLock`,
//!   persisted as JSON
//! - [`RunStats`]: Atomic counters for processed files, error files, parse
//!   failures and cache hits
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use xc_scanner::{ScanConfig, Scanner};
//! use xc_ts_parser::ExtractionRules;
//!
//! let config = ScanConfig::new(Utf8Path::new("./web"), ExtractionRules::usage());
//! let scanner = Scanner::new(config)?;
//!
//! let result = scanner.scan()?;
//! println!(
//!     "{} endpoints from {} files ({} failed)",
//!     result.inventory.endpoint_count(),
//!     result.stats.processed,
//!     result.stats.error_files,
//! );
//! # Ok::<(), xc_scanner::ScanError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! Scanner (main entry point)
//!     │
//!     ├── FileWalker (collect paths)
//!     │       │
//!     │       └── WalkBuilder (ignore crate)
//!     │
//!     ├── orchestrator (sequential, or rayon pool + coordinator)
//!     │       │
//!     │       └── FileExtractor per worker (xc-ts-parser)
//!     │
//!     ├── ExtractionCache (FxHashMap + RwLock, JSON on disk)
//!     │
//!     └── RunStats (atomic counters)
//! ```
//!
//! # Failure Handling
//!
//! Configuration problems fail [`Scanner::new`] before any file is read. Once
//! a run starts, an unreadable file or a panicking extractor only adds an
//! entry to [`ScanResult::errors`]; the run always completes.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod cache;
mod error;
mod inventory;
pub mod orchestrator;
mod stats;
mod walker;

pub use cache::{COMPONENTS_FILE, ENDPOINTS_FILE, ExtractionCache, MODELS_FILE};
pub use error::ScanError;
pub use inventory::Inventory;
pub use stats::{RunStats, RunStatsSnapshot};
pub use walker::FileWalker;

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};
use xc_core::{AnalyzerConfig, Config};
use xc_ts_parser::{ExtractionRules, FileExtractor};

/// Configuration for one side of an analysis.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use xc_core::AnalyzerConfig;
/// use xc_scanner::ScanConfig;
/// use xc_ts_parser::ExtractionRules;
///
/// let config = ScanConfig::new(Utf8Path::new("./server"), ExtractionRules::declaration())
///     .with_analyzer(AnalyzerConfig { parallel: false, ..AnalyzerConfig::default() });
/// assert_eq!(config.rules.name, "declaration");
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory of the codebase.
    pub root: Utf8PathBuf,
    /// Which calls count as endpoints.
    pub rules: ExtractionRules,
    /// Run settings.
    pub analyzer: AnalyzerConfig,
    /// Whether to follow symbolic links.
    pub follow_links: bool,
}

impl ScanConfig {
    /// Creates a scan configuration with default run settings.
    #[must_use]
    pub fn new(root: &Utf8Path, rules: ExtractionRules) -> Self {
        Self {
            root: root.to_owned(),
            rules,
            analyzer: AnalyzerConfig::default(),
            follow_links: false,
        }
    }

    /// Replaces the run settings.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct ScanResult {
    /// Merged entities.
    pub inventory: Inventory,
    /// Statistics snapshot from the run.
    pub stats: RunStatsSnapshot,
    /// Files that could not be extracted, in input order.
    pub errors: Vec<(Utf8PathBuf, ScanError)>,
}

impl ScanResult {
    /// Returns the paths of the files that could not be extracted.
    pub fn error_files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.errors.iter().map(|(path, _)| path.as_path())
    }
}

/// Extracts the inventory of one codebase.
///
/// # Cloning
///
/// `Scanner` is cheaply cloneable via internal `Arc` references. Clones share
/// the same cache and statistics.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Scanner configuration.
    config: ScanConfig,
    /// Content-hash cache (shared via Arc for cloning).
    cache: Arc<ExtractionCache>,
    /// Statistics counters (shared via Arc for cloning).
    stats: Arc<RunStats>,
}

impl Scanner {
    /// Creates a new scanner.
    ///
    /// Loads the persisted cache when caching is enabled. A cache that cannot
    /// be read is logged and replaced by an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root is not a directory,
    /// [`ScanError::InvalidConfig`] if a run setting is invalid, and
    /// [`ScanError::Setup`] if the extractor cannot be built.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        if !config.root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {}",
                config.root
            )));
        }
        if !config.root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {}",
                config.root
            )));
        }

        Config {
            analyzer: config.analyzer.clone(),
            ..Config::default()
        }
        .validate()?;

        // Surfaces grammar and pattern failures before any worker starts.
        FileExtractor::new(config.rules.clone(), &config.analyzer)?;

        let cache = if config.analyzer.cache_enabled {
            ExtractionCache::load(&config.analyzer.cache_dir).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable extraction cache");
                ExtractionCache::new()
            })
        } else {
            ExtractionCache::new()
        };

        info!(
            root = %config.root,
            rules = %config.rules.name,
            parallel = config.analyzer.parallel,
            cached_entries = cache.len(),
            "Creating scanner"
        );

        Ok(Self {
            config,
            cache: Arc::new(cache),
            stats: Arc::new(RunStats::new()),
        })
    }

    /// Discovers the source files under the configured root, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    pub fn discover(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        FileWalker::new(&self.config.root)?
            .with_config(&self.config.analyzer)
            .with_follow_links(self.config.follow_links)
            .collect_paths()
    }

    /// Discovers and extracts every source file under the configured root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        info!(root = %self.config.root, "Starting scan");
        let paths = self.discover()?;
        info!(count = paths.len(), "Collected source files");
        self.extract_files(&paths)
    }

    /// Extracts the given files.
    ///
    /// Statistics are reset first. When caching is enabled, new entries are
    /// persisted afterwards; a failed write is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the worker pool cannot be built.
    pub fn extract_files(&self, paths: &[Utf8PathBuf]) -> Result<ScanResult, ScanError> {
        self.stats.reset();

        let cache = self
            .config
            .analyzer
            .cache_enabled
            .then_some(self.cache.as_ref());
        let collected = orchestrator::run(
            paths,
            &self.config.rules,
            &self.config.analyzer,
            cache,
            &self.stats,
        )?;

        if cache.is_some() && self.cache.is_dirty() {
            if let Err(e) = self.cache.save(&self.config.analyzer.cache_dir) {
                warn!(error = %e, "Failed to persist extraction cache");
            }
        }

        let stats = self.stats.snapshot();
        info!(
            processed = stats.processed,
            error_files = stats.error_files,
            parse_errors = stats.parse_errors,
            parse_timeouts = stats.parse_timeouts,
            cache_hits = stats.cache_hits,
            endpoints = collected.inventory.endpoint_count(),
            models = collected.inventory.model_count(),
            components = collected.inventory.component_count(),
            "Scan completed"
        );

        Ok(ScanResult {
            inventory: collected.inventory,
            stats,
            errors: collected.errors,
        })
    }

    /// Returns a snapshot of current statistics.
    #[must_use]
    pub fn stats(&self) -> RunStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns a reference to the underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    /// Returns the scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_cache() -> AnalyzerConfig {
        AnalyzerConfig {
            cache_enabled: false,
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn test_scan_config_new() {
        let config = ScanConfig::new(Utf8Path::new("./src"), ExtractionRules::usage());
        assert_eq!(config.root.as_str(), "./src");
        assert_eq!(config.analyzer, AnalyzerConfig::default());
        assert!(!config.follow_links);
    }

    #[test]
    fn test_scan_config_with_follow_links() {
        let config = ScanConfig::new(Utf8Path::new("./src"), ExtractionRules::usage())
            .with_follow_links(true);
        assert!(config.follow_links);
    }

    #[test]
    fn test_scanner_invalid_root() {
        let config = ScanConfig::new(
            Utf8Path::new("/nonexistent/path/that/does/not/exist"),
            ExtractionRules::usage(),
        );
        let err = Scanner::new(config).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_scanner_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let config = ScanConfig::new(root, ExtractionRules::usage()).with_analyzer(AnalyzerConfig {
            max_workers: 0,
            ..no_cache()
        });
        let err = Scanner::new(config).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn test_scan_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let scanner =
            Scanner::new(ScanConfig::new(root, ExtractionRules::usage()).with_analyzer(no_cache()))
                .unwrap();

        let result = scanner.scan().unwrap();
        assert!(result.inventory.is_empty());
        assert_eq!(result.stats, RunStatsSnapshot::default());
        assert_eq!(result.error_files().count(), 0);
    }
}
