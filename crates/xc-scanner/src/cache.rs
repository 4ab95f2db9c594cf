//! Content-hash cache for extraction results.
//!
//! This module provides [`ExtractionCache`], a thread-safe map from a cache
//! key to the [`FileExtraction`] computed for it. A key combines the rule
//! preset, the parse mode, the grammar and fallback component name implied by
//! the file path, and the xxh3 hash of the file text. A byte-identical file
//! analyzed with the same settings under an equivalent name is never parsed
//! twice.
//!
//! # Access Pattern
//!
//! - Lookups take a read lock and **clone** the entry out
//! - Inserts take a short write lock
//! - No guard is ever returned to the caller
//!
//! # Persistence
//!
//! [`ExtractionCache::save`] writes one JSON file per registry
//! (`endpoints.json`, `models.json`, `components.json`), each an object from
//! cache key to the entities of that kind. Every key appears in all three
//! files so empty extractions survive a reload.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use xc_core::AnalyzerConfig;
//! use xc_scanner::ExtractionCache;
//! use xc_ts_parser::{ExtractionRules, FileExtraction};
//!
//! let cache = ExtractionCache::new();
//! let rules = ExtractionRules::usage();
//! let path = Utf8Path::new("src/api.ts");
//! let key = ExtractionCache::key(&rules, &AnalyzerConfig::default(), path, "export {}");
//! cache.insert(key.clone(), FileExtraction::default());
//! assert!(cache.get(&key).is_some());
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::Utf8Path;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use xc_core::{AnalyzerConfig, FxHashMap, content_hash};
use xc_ts_parser::{ExtractionRules, FileExtraction, SourceKind, file_component_name};

use crate::error::ScanError;

/// Cache file holding endpoints.
pub const ENDPOINTS_FILE: &str = "endpoints.json";
/// Cache file holding models.
pub const MODELS_FILE: &str = "models.json";
/// Cache file holding components.
pub const COMPONENTS_FILE: &str = "components.json";

/// A thread-safe cache of extraction results keyed by content.
///
/// `ExtractionCache` is both `Send` and `Sync`; workers may read and write it
/// concurrently. Cached extractions carry the locations of the file that
/// produced them, so callers [`relocate`](FileExtraction::relocate) hits.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: RwLock<FxHashMap<String, FileExtraction>>,
    dirty: AtomicBool,
}

impl ExtractionCache {
    /// Creates a new empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cache key for `text` read from `path` and extracted under
    /// `rules` and the parse mode of `config`.
    ///
    /// The path contributes the grammar and the component name a file without
    /// a PascalCase export falls back to, since both change the extraction.
    #[must_use]
    pub fn key(
        rules: &ExtractionRules,
        config: &AnalyzerConfig,
        path: &Utf8Path,
        text: &str,
    ) -> String {
        let mode = if config.use_structured_parse { "tree" } else { "text" };
        let grammar = match SourceKind::from_path(path) {
            SourceKind::TypeScript => "ts",
            SourceKind::Tsx => "tsx",
        };
        format!(
            "{}-{mode}-{grammar}-{}-{:016x}",
            rules.name,
            file_component_name(path),
            content_hash(text.as_bytes())
        )
    }

    /// Returns a clone of the cached extraction for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<FileExtraction> {
        self.entries.read().get(key).cloned()
    }

    /// Stores an extraction. The parse outcome is not cached.
    pub fn insert(&self, key: String, mut extraction: FileExtraction) {
        extraction.parse_failure = None;
        self.entries.write().insert(key, extraction);
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Returns the number of cached extractions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns `true` if entries were inserted since the last load or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Loads the cache persisted in `dir`.
    ///
    /// A missing directory or missing files yield an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Cache`] if a file exists but cannot be read or
    /// decoded.
    pub fn load(dir: &Utf8Path) -> Result<Self, ScanError> {
        let endpoints = read_registry(&dir.join(ENDPOINTS_FILE))?;
        let models = read_registry(&dir.join(MODELS_FILE))?;
        let components = read_registry(&dir.join(COMPONENTS_FILE))?;

        let mut entries: FxHashMap<String, FileExtraction> = FxHashMap::default();
        for (key, list) in endpoints {
            entries.entry(key).or_default().endpoints = list;
        }
        for (key, list) in models {
            entries.entry(key).or_default().models = list;
        }
        for (key, list) in components {
            entries.entry(key).or_default().components = list;
        }

        debug!(%dir, entries = entries.len(), "Loaded extraction cache");
        Ok(Self {
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
        })
    }

    /// Writes the cache to `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Cache`] if the directory or a file cannot be
    /// written.
    pub fn save(&self, dir: &Utf8Path) -> Result<(), ScanError> {
        std::fs::create_dir_all(dir).map_err(|e| ScanError::cache(dir, e))?;

        let entries = self.entries.read();
        let sorted: BTreeMap<&str, &FileExtraction> =
            entries.iter().map(|(k, v)| (k.as_str(), v)).collect();

        write_registry(&dir.join(ENDPOINTS_FILE), &sorted, |e| &e.endpoints)?;
        write_registry(&dir.join(MODELS_FILE), &sorted, |e| &e.models)?;
        write_registry(&dir.join(COMPONENTS_FILE), &sorted, |e| &e.components)?;

        self.dirty.store(false, Ordering::Relaxed);
        debug!(%dir, entries = sorted.len(), "Saved extraction cache");
        Ok(())
    }
}

fn read_registry<T: DeserializeOwned>(
    path: &Utf8Path,
) -> Result<BTreeMap<String, Vec<T>>, ScanError> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| ScanError::cache(path, e))?;
    serde_json::from_str(&text).map_err(|e| ScanError::cache(path, e))
}

fn write_registry<T: Serialize>(
    path: &Utf8Path,
    entries: &BTreeMap<&str, &FileExtraction>,
    select: impl Fn(&FileExtraction) -> &Vec<T>,
) -> Result<(), ScanError> {
    let registry: BTreeMap<&str, &Vec<T>> = entries.iter().map(|(k, v)| (*k, select(v))).collect();
    let json = serde_json::to_string(&registry).map_err(|e| ScanError::cache(path, e))?;
    std::fs::write(path, json).map_err(|e| ScanError::cache(path, e))
}

#[cfg(test)]
mod tests {
    use xc_core::{ApiEndpoint, Component, DataModel, HttpMethod, ObservedType, SourceLocation};
    use xc_ts_parser::ParseFailure;

    use super::*;

    fn sample() -> FileExtraction {
        let mut endpoint = ApiEndpoint::new(HttpMethod::Get, "/api/users");
        endpoint.locations.insert(SourceLocation::new("src/api.ts", 4));
        let mut model = DataModel::new("User");
        model.add_field("id", ObservedType::Number, true);
        FileExtraction {
            endpoints: vec![endpoint],
            models: vec![model],
            components: vec![Component::new("UserList", "src/UserList.tsx")],
            parse_failure: None,
        }
    }

    #[test]
    fn test_cache_new() {
        let cache = ExtractionCache::new();
        assert!(cache.is_empty());
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_key_depends_on_rules_mode_and_content() {
        let config = AnalyzerConfig::default();
        let text_mode = AnalyzerConfig {
            use_structured_parse: false,
            ..AnalyzerConfig::default()
        };
        let usage = ExtractionRules::usage();
        let path = Utf8Path::new("src/api.ts");

        let key = ExtractionCache::key(&usage, &config, path, "a");
        assert_eq!(key, ExtractionCache::key(&usage, &config, path, "a"));
        assert_ne!(key, ExtractionCache::key(&usage, &config, path, "b"));
        assert_ne!(key, ExtractionCache::key(&usage, &text_mode, path, "a"));
        let declaration = ExtractionRules::declaration();
        assert_ne!(key, ExtractionCache::key(&declaration, &config, path, "a"));
        assert!(key.starts_with("usage-tree-ts-Api-"));
    }

    #[test]
    fn test_key_depends_on_path_name_and_grammar() {
        let config = AnalyzerConfig::default();
        let usage = ExtractionRules::usage();
        let key = |path: &str| ExtractionCache::key(&usage, &config, Utf8Path::new(path), "a");

        assert_ne!(key("src/Alpha.jsx"), key("src/Beta.jsx"));
        assert_ne!(key("src/api.ts"), key("src/api.tsx"));
        assert_eq!(key("src/Alpha.jsx"), key("lib/Alpha.jsx"));
        assert_eq!(key("src/Nav/index.tsx"), key("src/Nav.tsx"));
    }

    #[test]
    fn test_insert_drops_parse_failure() {
        let cache = ExtractionCache::new();
        let extraction = FileExtraction {
            parse_failure: Some(ParseFailure::Timeout),
            ..sample()
        };
        cache.insert("k".to_owned(), extraction);

        assert!(cache.is_dirty());
        assert_eq!(cache.get("k").and_then(|e| e.parse_failure), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap().join("cache");

        let cache = ExtractionCache::new();
        cache.insert("usage-tree-1".to_owned(), sample());
        cache.insert("usage-tree-2".to_owned(), FileExtraction::default());
        cache.save(&dir).unwrap();
        assert!(!cache.is_dirty());

        for file in [ENDPOINTS_FILE, MODELS_FILE, COMPONENTS_FILE] {
            assert!(dir.join(file).is_file());
        }

        let loaded = ExtractionCache::load(&dir).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("usage-tree-1"), Some(sample()));
        assert_eq!(loaded.get("usage-tree-2"), Some(FileExtraction::default()));
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let cache = ExtractionCache::load(Utf8Path::new("/nonexistent/xcompat-cache")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(dir.join(MODELS_FILE), "[1, 2").unwrap();

        let err = ExtractionCache::load(dir).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains(MODELS_FILE));
    }
}
