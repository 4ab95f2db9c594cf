//! Observed type tags.
//!
//! Field, parameter, prop and state types are recorded as sets of small tags
//! rather than full type expressions. A set only ever widens: observing a
//! field as `string` in one file and `null` in another keeps both.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of observed type tags, sorted for serialization.
pub type TypeSet = BTreeSet<ObservedType>;

/// A growable multimap from a field, parameter, prop or state name to its tags.
pub type FieldTypes = BTreeMap<String, TypeSet>;

/// A coarse type tag observed for a field, parameter, prop or state slot.
///
/// # Examples
///
/// ```
/// use xc_core::ObservedType;
///
/// assert_eq!(ObservedType::from_annotation("string"), ObservedType::String);
/// assert_eq!(ObservedType::from_annotation("User[]"), ObservedType::Array);
/// assert_eq!(
///     ObservedType::from_annotation("Address"),
///     ObservedType::Reference("Address".to_owned())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedType {
    /// `string` or a string literal.
    String,
    /// `number`, `bigint` or a numeric literal.
    Number,
    /// `boolean` or `true`/`false`.
    Boolean,
    /// `null` or `undefined`.
    Null,
    /// An array or tuple.
    Array,
    /// An object literal, record or map.
    Object,
    /// A `Date`.
    Date,
    /// Observed without usable type detail.
    Unknown,
    /// A named type, usually another model.
    Reference(String),
}

impl ObservedType {
    /// Maps a TypeScript type annotation to a tag.
    ///
    /// Only the outermost shape is inspected. Union types should be split by
    /// the caller and each member mapped on its own.
    #[must_use]
    pub fn from_annotation(annotation: &str) -> Self {
        let text = annotation.trim();
        match text {
            "string" | "String" => return Self::String,
            "number" | "Number" | "bigint" => return Self::Number,
            "boolean" | "Boolean" | "true" | "false" => return Self::Boolean,
            "null" | "undefined" | "void" => return Self::Null,
            "Date" => return Self::Date,
            "object" | "Object" => return Self::Object,
            "" | "any" | "unknown" | "never" => return Self::Unknown,
            _ => {}
        }
        if text.ends_with("[]") || text.starts_with("Array<") || text.starts_with('[') {
            return Self::Array;
        }
        if text.starts_with('{')
            || text.starts_with("Record<")
            || text.starts_with("Map<")
            || text.starts_with("Partial<")
        {
            return Self::Object;
        }
        if text.starts_with('\'') || text.starts_with('"') || text.starts_with('`') {
            return Self::String;
        }
        if text.parse::<f64>().is_ok() {
            return Self::Number;
        }
        let name: String = text
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return Self::Reference(name);
        }
        Self::Unknown
    }

    /// Returns the referenced type name, if this is a reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ObservedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
            Self::Date => "date",
            Self::Unknown => "unknown",
            Self::Reference(name) => return f.write_str(name),
        };
        f.write_str(tag)
    }
}

/// Adds a tag to the set for `key`, creating the set on first sight.
pub fn observe(map: &mut FieldTypes, key: impl Into<String>, tag: ObservedType) {
    map.entry(key.into()).or_default().insert(tag);
}

/// Unions every set of `other` into `map`.
pub fn widen(map: &mut FieldTypes, other: FieldTypes) {
    for (key, tags) in other {
        map.entry(key).or_default().extend(tags);
    }
}
