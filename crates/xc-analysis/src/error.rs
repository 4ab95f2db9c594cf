//! Error types for the xc-analysis crate.

use xc_core::ConfigError;
use xc_scanner::ScanError;

/// Errors that can occur while analyzing one or two codebases.
///
/// Per-file problems never surface here; they are recorded in the scan
/// results. What remains is fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Scanning a side failed before extraction completed.
    #[error("scan of {side} codebase failed: {source}")]
    Scan {
        /// `"usage"` or `"declaration"`.
        side: &'static str,
        /// The underlying scanner error.
        #[source]
        source: ScanError,
    },

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A URL could not be turned into a matching pattern.
    #[error("invalid URL pattern {url}: {source}")]
    Pattern {
        /// The canonical URL.
        url: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A component named on the command line does not exist.
    #[error("component not found: {0}")]
    UnknownComponent(String),
}

impl AnalysisError {
    /// Creates a scan error for one side.
    #[must_use]
    pub const fn scan(side: &'static str, source: ScanError) -> Self {
        Self::Scan { side, source }
    }

    /// Returns `true` if the error comes from user input rather than the
    /// analyzed code.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnknownComponent(_))
    }
}
