//! Core types, errors, and configuration for xcompat.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - Entity types extracted from source text ([`ApiEndpoint`], [`DataModel`],
//!   [`Component`]) and the findings produced over them ([`NamingIssue`],
//!   [`CodePattern`], [`CompatibilityRecord`])
//! - The analyzer and detector configuration ([`Config`])
//! - [`ConfigError`] for fatal, pre-extraction failures
//! - `FxHashMap`/`FxHashSet` aliases and the stable content hash

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{AnalyzerConfig, Config, DetectorConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, content_hash, fx_hash_map, fx_hash_set};
pub use types::*;
