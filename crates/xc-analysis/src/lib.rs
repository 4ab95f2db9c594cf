//! Relationship graph, inventory matching and pattern detection.
//!
//! This crate takes the inventories produced by `xc-scanner` and derives
//! everything that needs more than one file at a time:
//!
//! - [`url`]: URL canonicalization and wildcard patterns
//! - [`matching`]: Model and endpoint matching between a usage inventory and
//!   a declaration inventory, producing a
//!   [`CompatibilityRecord`](xc_core::CompatibilityRecord)
//! - [`RelationshipGraph`]: Components → endpoints → models, with tree
//!   rendering
//! - [`PatternDetector`]: Heuristic issues and code patterns
//! - [`Analyzer`]: Runs all of the above and assembles an [`AnalysisReport`]
//!
//! # Example
//!
//! ```
//! use xc_analysis::{canonicalize_url, jaccard};
//! use std::collections::BTreeSet;
//!
//! assert_eq!(canonicalize_url("/items/:id"), canonicalize_url("items/{id}/"));
//!
//! let a: BTreeSet<_> = ["id", "name"].into();
//! assert_eq!(jaccard(&a, &a), 1.0);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod detector;
mod error;
mod graph;
pub mod matching;
mod pipeline;
mod report;
pub mod url;

pub use detector::{CREDENTIAL_QUERY_KEYS, Findings, PatternDetector, REST_VERBS};
pub use error::AnalysisError;
pub use graph::{CIRCULAR_MARKER, EdgeKind, GraphNode, RelationshipGraph};
pub use matching::{jaccard, match_inventories};
pub use pipeline::Analyzer;
pub use report::{AnalysisReport, SideReport};
pub use url::{canonicalize_url, url_pattern};
