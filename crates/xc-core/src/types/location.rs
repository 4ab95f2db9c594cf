//! Source location types.
//!
//! Entities carry the set of places they were observed. A location is a file
//! path plus a 1-indexed line; columns are not tracked because every finding
//! is reported per line.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A line within a source file.
///
/// Ordered by path, then line, so location sets serialize deterministically.
///
/// # Examples
///
/// ```
/// use xc_core::SourceLocation;
///
/// let loc = SourceLocation::new("src/api/users.ts", 12);
/// assert_eq!(loc.to_string(), "src/api/users.ts:12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the file, as discovered by the walker.
    pub file: Utf8PathBuf,

    /// Line number (1-indexed).
    pub line: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[must_use]
    pub fn new(file: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Returns a copy of this location pointing at another file.
    #[must_use]
    pub fn with_file(&self, file: &Utf8Path) -> Self {
        Self {
            file: file.to_owned(),
            line: self.line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
