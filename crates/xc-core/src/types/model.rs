//! Data model types.
//!
//! A [`DataModel`] is identified by name. Its field-type sets and
//! relationships only widen when further declarations of the same name are
//! merged in.

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use super::location::SourceLocation;
use super::observed::{FieldTypes, ObservedType, widen};

/// The cardinality or inheritance link between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// The model holds a list of the related model.
    OneToMany,
    /// The model holds a single reference to the related model.
    ManyToOne,
    /// Both sides hold lists.
    ManyToMany,
    /// A single reference on both sides.
    OneToOne,
    /// The model extends the related model.
    Extends,
}

/// A link from a model to a related model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Kind of link.
    pub kind: RelationshipKind,
    /// Field that carries the link, absent for inheritance.
    pub field: Option<String>,
    /// Whether the link may be null or omitted.
    pub nullable: bool,
}

impl Relationship {
    /// Creates a field-backed relationship.
    #[must_use]
    pub fn via_field(kind: RelationshipKind, field: impl Into<String>, nullable: bool) -> Self {
        Self {
            kind,
            field: Some(field.into()),
            nullable,
        }
    }

    /// Creates an inheritance relationship.
    #[must_use]
    pub const fn extends() -> Self {
        Self {
            kind: RelationshipKind::Extends,
            field: None,
            nullable: false,
        }
    }
}

/// A data model reconstructed from declarations and request bodies.
///
/// # Examples
///
/// ```
/// use xc_core::{DataModel, ObservedType};
///
/// let mut user = DataModel::new("User");
/// user.add_field("id", ObservedType::Number, true);
/// user.add_field("email", ObservedType::String, false);
///
/// assert_eq!(user.field_names().count(), 2);
/// assert!(user.required.contains("id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    /// Model name.
    pub name: String,

    /// Field name to observed type tags.
    pub fields: FieldTypes,

    /// Related model name to relationship descriptor.
    pub relationships: BTreeMap<String, Relationship>,

    /// Every place this model was declared or inferred.
    pub locations: BTreeSet<SourceLocation>,

    /// URLs of endpoints that reference this model.
    pub endpoints: BTreeSet<String>,

    /// Fields declared without `?`.
    pub required: BTreeSet<String>,

    /// Fields named by an interface, type alias or class. Empty when the
    /// model was only inferred from request bodies.
    #[serde(default)]
    pub declared: BTreeSet<String>,
}

impl DataModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: FieldTypes::new(),
            relationships: BTreeMap::new(),
            locations: BTreeSet::new(),
            endpoints: BTreeSet::new(),
            required: BTreeSet::new(),
            declared: BTreeSet::new(),
        }
    }

    /// Records a field observation.
    pub fn add_field(&mut self, name: impl Into<String>, tag: ObservedType, required: bool) {
        let name = name.into();
        if required {
            self.required.insert(name.clone());
        }
        self.fields.entry(name).or_default().insert(tag);
    }

    /// Returns `true` if a declaration contributed to this model.
    #[must_use]
    pub fn is_declared(&self) -> bool {
        !self.declared.is_empty()
    }

    /// Iterates field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Folds another extraction of the same model into this one.
    ///
    /// A relationship seen in both keeps the first kind and becomes nullable
    /// if either side was.
    pub fn merge(&mut self, other: Self) {
        widen(&mut self.fields, other.fields);
        for (target, rel) in other.relationships {
            self.relationships
                .entry(target)
                .and_modify(|existing| existing.nullable |= rel.nullable)
                .or_insert(rel);
        }
        self.locations.extend(other.locations);
        self.endpoints.extend(other.endpoints);
        self.required.extend(other.required);
        self.declared.extend(other.declared);
    }

    /// Points every location at `file`.
    pub fn relocate(&mut self, file: &Utf8Path) {
        self.locations = self.locations.iter().map(|l| l.with_file(file)).collect();
    }
}
