//! Directory traversal for JavaScript and TypeScript sources.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to
//! walk a codebase while respecting `.gitignore` patterns.
//!
//! # Filters
//!
//! - Respects `.gitignore` and `.ignore` patterns, skips hidden entries
//! - Keeps `.ts`, `.tsx`, `.js`, `.jsx`, `.mjs` and `.cjs` files
//! - Skips build and tooling directories plus any configured directory names
//! - Skips files whose name contains a configured marker (`.min.`, `.d.ts`)
//! - Skips test files unless tests are included
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use xc_core::AnalyzerConfig;
//! use xc_scanner::FileWalker;
//!
//! let walker = FileWalker::new(Utf8Path::new("./web"))?.with_config(&AnalyzerConfig::default());
//! for path in walker.collect_paths()? {
//!     println!("Found: {path}");
//! }
//! # Ok::<(), xc_scanner::ScanError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use xc_core::AnalyzerConfig;

use crate::error::ScanError;

/// Directories that never hold analyzable sources.
const SKIP_DIRECTORIES: &[&str] = &[
    ".git",
    ".next",
    ".nuxt",
    ".turbo",
    ".angular",
    ".svelte-kit",
    "__pycache__",
];

/// Source file extensions to include in the walk.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// File name markers of test sources.
const TEST_MARKERS: &[&str] = &[".test.", ".spec."];

/// Directory holding test sources.
const TEST_DIRECTORY: &str = "__tests__";

/// A file walker that discovers source files in a directory tree.
///
/// Paths are collected single-threaded and returned sorted, so the order the
/// orchestrator sees is the same on every run.
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Directory names to skip (beyond [`SKIP_DIRECTORIES`]).
    skip_dirs: Vec<String>,
    /// File name substrings that exclude a file.
    file_markers: Vec<String>,
    /// Whether test files are kept.
    include_tests: bool,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            file_markers: Vec::new(),
            include_tests: false,
            follow_links: false,
        })
    }

    /// Applies the directory, marker and test filters of `config`.
    #[must_use]
    pub fn with_config(mut self, config: &AnalyzerConfig) -> Self {
        self.skip_dirs.extend(config.excluded_dir_names.iter().cloned());
        self.file_markers
            .extend(config.excluded_file_markers.iter().cloned());
        self.include_tests = config.include_tests;
        self
    }

    /// Adds directories to skip during traversal.
    ///
    /// # Arguments
    ///
    /// * `dirs` - Directory names to skip (not full paths)
    #[must_use]
    pub fn with_skip_dirs(mut self, dirs: &[&str]) -> Self {
        self.skip_dirs.extend(dirs.iter().map(ToString::to_string));
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects all source file paths in the directory tree, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    /// Returns [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            if !is_source_file(utf8_path) {
                continue;
            }

            let relative = utf8_path.strip_prefix(&self.root).unwrap_or(utf8_path);
            if self.should_skip_path(relative) {
                continue;
            }

            paths.push(utf8_path.to_owned());
        }

        paths.sort_unstable();
        Ok(paths)
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            // .gitignore, .ignore and hidden files
            .standard_filters(true)
            .follow_links(self.follow_links)
            // Extraction is parallelized later
            .threads(1)
            .require_git(false)
            .build()
    }

    /// Checks a root-relative path against the directory, marker and test
    /// filters.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let mut components = path.components().peekable();
        while let Some(component) = components.next() {
            let name = component.as_str();
            let is_file = components.peek().is_none();

            if is_file {
                if self.file_markers.iter().any(|m| name.contains(m.as_str())) {
                    return true;
                }
                if !self.include_tests && TEST_MARKERS.iter().any(|m| name.contains(m)) {
                    return true;
                }
                continue;
            }

            if SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name) {
                return true;
            }
            if !self.include_tests && name == TEST_DIRECTORY {
                return true;
            }
        }

        false
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// Checks if a path is a JavaScript or TypeScript source by extension.
fn is_source_file(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
