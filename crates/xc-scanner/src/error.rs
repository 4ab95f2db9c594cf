//! Error types for the xc-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during discovery, caching and per-file extraction.

use camino::Utf8PathBuf;
use xc_core::ConfigError;

/// Errors that can occur during an extraction run.
///
/// # Error Recovery Strategy
///
/// - **Configuration and walk errors** ([`ScanError::Config`],
///   [`ScanError::InvalidConfig`], [`ScanError::Walk`]): Fatal, raised before
///   any file is extracted
/// - **Per-file errors** ([`ScanError::Read`], [`ScanError::Extract`]): Log
///   warning, record the file as an error file, continue the run
/// - **Cache errors** ([`ScanError::Cache`]): Log warning, run without the
///   persisted entries
///
/// # Examples
///
/// ```
/// use xc_scanner::ScanError;
///
/// fn handle_error(err: &ScanError) -> &'static str {
///     if err.is_recoverable() { "skip file" } else { "abort run" }
/// }
///
/// assert_eq!(handle_error(&ScanError::config("root is a file")), "abort run");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a source file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Extraction of one file panicked or the worker carrying it was lost.
    #[error("failed to extract file {path}: {message}")]
    Extract {
        /// The path of the file being extracted.
        path: Utf8PathBuf,
        /// The panic payload or a description of the loss.
        message: String,
    },

    /// The extractor could not be set up.
    #[error("failed to initialize extractor: {0}")]
    Setup(#[from] xc_ts_parser::ParseError),

    /// A persisted cache file could not be read or written.
    #[error("cache file {path}: {message}")]
    Cache {
        /// The cache file.
        path: Utf8PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Invalid run parameters.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An invalid configuration value.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Extract`] error.
    #[inline]
    pub fn extract(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::Extract {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new [`ScanError::Cache`] error.
    #[inline]
    pub fn cache(path: impl Into<Utf8PathBuf>, message: impl ToString) -> Self {
        Self::Cache {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (the run can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Extract { .. } | Self::Cache { .. }
        )
    }

    /// Returns `true` if this error is fatal (the run should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Extract { path, .. } | Self::Cache { path, .. } => {
                Some(path)
            }
            Self::Walk(_)
            | Self::Setup(_)
            | Self::Config(_)
            | Self::InvalidConfig(_)
            | Self::NonUtf8Path(_)
            | Self::Pool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_scan_error_read() {
        let err = ScanError::read(
            "src/api.ts",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("src/api.ts"));
        assert!(err.to_string().contains("src/api.ts"));
    }

    #[test]
    fn test_scan_error_extract() {
        let err = ScanError::extract("src/Big.tsx", "index out of bounds");
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("src/Big.tsx"));
        assert!(err.to_string().contains("index out of bounds"));
    }

    #[test]
    fn test_scan_error_setup_is_fatal() {
        let err = ScanError::from(xc_ts_parser::ParseError::LanguageInit);
        assert!(err.is_fatal());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_scan_error_config() {
        let err = ScanError::config("invalid root path");
        assert!(!err.is_recoverable());
        assert!(err.is_fatal());
        assert!(err.path().is_none());
        assert_eq!(err.to_string(), "invalid configuration: invalid root path");
    }

    #[test]
    fn test_scan_error_invalid_config_is_transparent() {
        let err = ScanError::from(ConfigError::invalid_option("max_workers", "must be positive"));
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("invalid configuration option 'max_workers'"));
    }

    #[test]
    fn test_scan_error_non_utf8() {
        use std::path::PathBuf;
        let err = ScanError::NonUtf8Path(PathBuf::from("test"));
        assert!(err.is_fatal());
        assert!(err.path().is_none());
    }
}
