//! Domain types for xcompat.
//!
//! # Module Organization
//!
//! - [`endpoint`] - API endpoints and their identity
//! - [`model`] - Data models and relationships
//! - [`component`] - UI components
//! - [`import`] - Import statements
//! - [`observed`] - Observed type tags
//! - [`finding`] - Issues, patterns and compatibility records
//! - [`location`] - Source locations
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use xc_core::{ApiEndpoint, DataModel, Component, CompatibilityRecord};
//! ```

pub mod component;
pub mod endpoint;
pub mod finding;
pub mod import;
pub mod location;
pub mod model;
pub mod observed;

pub use component::{Component, ComponentKey};
pub use endpoint::{
    ApiEndpoint, EndpointKey, HttpMethod, UnknownMethod, is_param_segment, resource_segment,
};
pub use finding::{
    CodePattern, CompatibilityRecord, EndpointMatch, ModelMatch, NamingIssue, PatternCategory,
    PatternRegistry, Severity,
};
pub use import::{ImportInfo, ImportKind};
pub use location::SourceLocation;
pub use model::{DataModel, Relationship, RelationshipKind};
pub use observed::{FieldTypes, ObservedType, TypeSet, observe, widen};
