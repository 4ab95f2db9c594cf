//! Tolerant TypeScript/JavaScript parsing and entity extraction.
//!
//! This crate turns one source file into the entities a compatibility
//! analysis compares:
//!
//! - API endpoints, from client calls or server route declarations
//! - Data models, from interfaces, object type aliases, classes and literal
//!   request bodies
//! - UI components, with their props, state, hooks, imports and complexity
//!
//! # Overview
//!
//! The main entry point is [`FileExtractor`]. It owns a [`TolerantParser`]
//! and one extractor per entity kind, and is configured with
//! [`ExtractionRules`] that say which calls count as endpoints:
//!
//! ```
//! use camino::Utf8Path;
//! use xc_core::{AnalyzerConfig, HttpMethod};
//! use xc_ts_parser::{ExtractionRules, FileExtractor};
//!
//! let mut server = FileExtractor::new(ExtractionRules::declaration(), &AnalyzerConfig::default())?;
//! let extraction = server.extract(
//!     Utf8Path::new("routes/users.js"),
//!     "router.delete('/api/users/:id', (req, res) => res.sendStatus(204));",
//! );
//!
//! let endpoint = &extraction.endpoints[0];
//! assert_eq!(endpoint.method, HttpMethod::Delete);
//! assert_eq!(endpoint.url, "/api/users/:id");
//! # Ok::<(), xc_ts_parser::ParseError>(())
//! ```
//!
//! # Two-Tier Extraction
//!
//! Every file first gets a structured tree-sitter parse under a time budget.
//! If the parse times out, is disabled, or produces a tree with syntax
//! errors, the extractors read the raw text with compiled patterns instead:
//!
//! | Outcome | Counter | Extraction |
//! |---------|---------|------------|
//! | Tree without errors | none | Tree walk |
//! | Budget exceeded | `parse_timeouts` | Patterns |
//! | Tree with errors | `parse_errors` | Patterns |
//! | Structured parse disabled | none | Patterns |
//!
//! The pattern tier has lower recall but never fails: extraction always
//! returns entities, possibly none.
//!
//! # Thread Safety
//!
//! [`FileExtractor`] and [`TolerantParser`] are `Send` but not `Sync`.
//! Create one per worker. Compiled queries and patterns are shared globally.

pub mod error;
pub mod extract;
pub mod fallback;
mod import;
pub mod naming;
mod parser;
pub mod queries;
pub mod rules;
mod syntax;

pub use error::{ParseError, ParseFailure};
pub use extract::{
    ComplexityBreakdown, ComponentExtractor, EndpointExtractor, Extractor, FileExtraction,
    FileExtractor, ModelExtractor, SourceUnit, complexity_score, file_component_name,
};
pub use import::extract_imports;
pub use parser::{ParseCounters, ParseTree, SourceKind, TolerantParser};
pub use rules::ExtractionRules;
