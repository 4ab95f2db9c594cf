//! UI component types.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointKey;
use super::import::ImportInfo;
use super::observed::{FieldTypes, widen};

/// The identity of a component: canonical name plus defining file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    /// Canonical component name.
    pub name: String,
    /// File the component is defined in.
    pub file: Utf8PathBuf,
}

/// A UI component reconstructed from one source file.
///
/// # Examples
///
/// ```
/// use xc_core::Component;
///
/// let mut card = Component::new("UserCard", "src/UserCard.tsx");
/// card.add_hook("useState");
/// card.add_hook("useEffect");
/// card.add_hook("useState");
/// assert_eq!(card.hooks, vec!["useState", "useEffect"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Canonical component name.
    pub name: String,

    /// File the component is defined in.
    pub file: Utf8PathBuf,

    /// Prop name to observed types.
    pub props: FieldTypes,

    /// Local state name to observed types.
    pub state: FieldTypes,

    /// Endpoints this component calls.
    pub endpoints: BTreeSet<EndpointKey>,

    /// Imports in source order.
    pub imports: Vec<ImportInfo>,

    /// Behavior units (hooks) invoked, in first-occurrence order.
    pub hooks: Vec<String>,

    /// Weighted complexity score.
    pub complexity: u32,

    /// Third-party package names imported.
    pub libraries: BTreeSet<String>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            props: FieldTypes::new(),
            state: FieldTypes::new(),
            endpoints: BTreeSet::new(),
            imports: Vec::new(),
            hooks: Vec::new(),
            complexity: 0,
            libraries: BTreeSet::new(),
        }
    }

    /// Returns this component's identity.
    #[must_use]
    pub fn key(&self) -> ComponentKey {
        ComponentKey {
            name: self.name.clone(),
            file: self.file.clone(),
        }
    }

    /// Records a hook call, keeping only the first occurrence.
    pub fn add_hook(&mut self, hook: impl Into<String>) {
        let hook = hook.into();
        if !self.hooks.contains(&hook) {
            self.hooks.push(hook);
        }
    }

    /// Records an import and, for third-party sources, its package.
    pub fn add_import(&mut self, import: ImportInfo) {
        if self.imports.contains(&import) {
            return;
        }
        if let Some(package) = import.package_name() {
            self.libraries.insert(package.to_owned());
        }
        self.imports.push(import);
    }

    /// Folds another extraction of the same component into this one.
    ///
    /// Ordered lists keep their existing order and append unseen entries;
    /// the complexity score keeps the larger value.
    pub fn merge(&mut self, other: Self) {
        widen(&mut self.props, other.props);
        widen(&mut self.state, other.state);
        self.endpoints.extend(other.endpoints);
        for import in other.imports {
            self.add_import(import);
        }
        for hook in other.hooks {
            self.add_hook(hook);
        }
        self.complexity = self.complexity.max(other.complexity);
        self.libraries.extend(other.libraries);
    }

    /// Moves the component to another file.
    pub fn relocate(&mut self, file: &Utf8Path) {
        file.clone_into(&mut self.file);
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::types::endpoint::HttpMethod;
    use crate::types::import::ImportKind;
    use crate::types::observed::ObservedType;

    #[test]
    fn test_add_import_tracks_libraries() {
        let mut c = Component::new("App", "src/App.tsx");
        c.add_import(ImportInfo::new("react", ImportKind::Default, smallvec!["React".to_owned()], 1));
        c.add_import(ImportInfo::new("./Header", ImportKind::Default, smallvec!["Header".to_owned()], 2));
        c.add_import(ImportInfo::new("react", ImportKind::Default, smallvec!["React".to_owned()], 1));

        assert_eq!(c.imports.len(), 2);
        assert_eq!(c.libraries.iter().collect::<Vec<_>>(), vec!["react"]);
    }

    #[test]
    fn test_merge_keeps_order_and_max_complexity() {
        let mut a = Component::new("List", "List.tsx");
        a.add_hook("useState");
        a.complexity = 12;
        a.props.entry("items".to_owned()).or_default().insert(ObservedType::Array);

        let mut b = Component::new("List", "List.tsx");
        b.add_hook("useEffect");
        b.add_hook("useState");
        b.complexity = 7;
        b.endpoints.insert(EndpointKey::new(HttpMethod::Get, "/items"));

        a.merge(b);
        assert_eq!(a.hooks, vec!["useState", "useEffect"]);
        assert_eq!(a.complexity, 12);
        assert_eq!(a.endpoints.len(), 1);
        assert!(a.props.contains_key("items"));
    }
}
