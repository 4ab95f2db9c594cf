//! Configuration structures for xcompat.
//!
//! - [`AnalyzerConfig`] - Extraction run settings (parallelism, parsing, caching, file filters)
//! - [`DetectorConfig`] - Thresholds for the pattern and issue heuristics
//! - [`Config`] - Root configuration combining both
//!
//! Every struct is `#[serde(default)]`, so a configuration file only needs to
//! name the options it changes.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for one extraction run over a codebase.
///
/// # Examples
///
/// ```
/// use xc_core::AnalyzerConfig;
///
/// let config = AnalyzerConfig::default();
/// assert!(config.parallel);
/// assert!(config.use_structured_parse);
/// assert_eq!(config.parse_timeout_seconds, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Whether large inputs are distributed across a worker pool.
    pub parallel: bool,

    /// Upper bound on worker threads. The pool is further bounded by the
    /// number of cores and the number of files.
    pub max_workers: usize,

    /// Whether test files (`.test.`, `.spec.`, `__tests__/`) are analyzed.
    pub include_tests: bool,

    /// Whether the tree-sitter parse is attempted before the pattern fallback.
    pub use_structured_parse: bool,

    /// Wall-clock budget for one structured parse.
    pub parse_timeout_seconds: f64,

    /// Whether extraction results are cached by content hash.
    pub cache_enabled: bool,

    /// Directory holding the persisted cache files.
    pub cache_dir: Utf8PathBuf,

    /// Directory names skipped during discovery, matched per path component.
    pub excluded_dir_names: Vec<String>,

    /// Substrings that exclude a file when present in its name.
    pub excluded_file_markers: Vec<String>,

    /// Inputs smaller than this are always processed sequentially.
    pub parallel_threshold: usize,

    /// A progress event is logged every this many completed files.
    pub progress_interval: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_workers: 8,
            include_tests: false,
            use_structured_parse: true,
            parse_timeout_seconds: 5.0,
            cache_enabled: true,
            cache_dir: Utf8PathBuf::from(".xcompat-cache"),
            excluded_dir_names: vec![
                "node_modules".to_owned(),
                "dist".to_owned(),
                "build".to_owned(),
                "coverage".to_owned(),
                "out".to_owned(),
            ],
            excluded_file_markers: vec![
                ".min.".to_owned(),
                ".d.ts".to_owned(),
                ".stories.".to_owned(),
            ],
            parallel_threshold: 10,
            progress_interval: 50,
        }
    }
}

impl AnalyzerConfig {
    /// Returns the structured parse budget as a [`Duration`].
    ///
    /// Non-finite or negative values collapse to zero; [`Config::validate`]
    /// rejects them before a run starts.
    #[must_use]
    pub fn parse_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.parse_timeout_seconds).unwrap_or(Duration::ZERO)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::invalid_option(
                "max_workers",
                "must be greater than zero",
            ));
        }
        if !self.parse_timeout_seconds.is_finite() || self.parse_timeout_seconds <= 0.0 {
            return Err(ConfigError::invalid_option(
                "parse_timeout_seconds",
                "must be a positive number of seconds",
            ));
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::invalid_option(
                "progress_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Thresholds for the pattern and issue detector.
///
/// # Examples
///
/// ```
/// use xc_core::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.max_props, 10);
/// assert_eq!(config.max_complexity, 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Components with more props than this are flagged.
    pub max_props: usize,

    /// Components scoring above this are flagged.
    pub max_complexity: u32,

    /// URL-shape groups need more than this many endpoints to be judged.
    pub min_group_size: usize,

    /// Models must share more than this many fields to count as duplicates.
    pub duplicate_min_fields: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_props: 10,
            max_complexity: 50,
            min_group_size: 2,
            duplicate_min_fields: 3,
        }
    }
}

/// Root configuration for xcompat.
///
/// # Examples
///
/// ```
/// use xc_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction run configuration.
    pub analyzer: AnalyzerConfig,

    /// Detector thresholds.
    pub detector: DetectorConfig,
}

impl Config {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// Missing keys take their default values.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::InvalidPath {
                path: path.to_owned(),
                reason: "configuration file does not exist".to_owned(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_config_defaults() {
        let config = AnalyzerConfig::default();
        assert!(config.parallel);
        assert!(!config.include_tests);
        assert!(config.cache_enabled);
        assert_eq!(config.parallel_threshold, 10);
        assert_eq!(config.progress_interval, 50);
        assert_eq!(config.parse_timeout(), Duration::from_secs(5));
        assert!(config.excluded_file_markers.contains(&".d.ts".to_owned()));
    }

    #[test]
    fn test_detector_config_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_group_size, 2);
        assert_eq!(config.duplicate_min_fields, 3);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"analyzer": {"max_workers": 2}, "detector": {"max_props": 4}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.analyzer.max_workers, 2);
        assert_eq!(config.detector.max_props, 4);
        assert!(config.analyzer.parallel);
        assert_eq!(config.detector.max_complexity, 50);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.analyzer.max_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_validate_rejects_non_positive_timeout() {
        let mut config = Config::default();
        config.analyzer.parse_timeout_seconds = 0.0;
        assert!(config.validate().is_err());
        config.analyzer.parse_timeout_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("xcompat.json")).unwrap();
        std::fs::write(&path, r#"{"analyzer": {"parallel": false}}"#).unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert!(!config.analyzer.parallel);
    }

    #[test]
    fn test_from_json_file_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("xcompat.json")).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = Config::from_json_file(Utf8Path::new("/nonexistent/xcompat.json")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }
}
