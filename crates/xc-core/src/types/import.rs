//! Import statement types.
//!
//! Imports are recorded per component in source order. They feed two
//! consumers: the graph builder, which links components that import each
//! other, and the third-party library list.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The kind of import statement.
///
/// # Examples
///
/// ```
/// use xc_core::ImportKind;
///
/// assert!(ImportKind::Dynamic.is_dynamic());
/// assert!(!ImportKind::SideEffect.has_bindings());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ImportKind {
    /// Named imports: `import { Foo, Bar } from '...'`
    Named,

    /// Default import: `import Foo from '...'`
    Default,

    /// Namespace import: `import * as Foo from '...'`
    Namespace,

    /// Side-effect import: `import '...'`
    SideEffect,

    /// Type-only import: `import type { Foo } from '...'`
    TypeOnly,

    /// Dynamic import: `await import('...')`
    Dynamic,
}

impl ImportKind {
    /// Returns `true` if this is a dynamic import.
    #[inline]
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Returns `true` if this import brings names into scope.
    #[inline]
    #[must_use]
    pub const fn has_bindings(self) -> bool {
        !matches!(self, Self::SideEffect)
    }
}

/// An import statement found in a source file.
///
/// # Examples
///
/// ```
/// use xc_core::{ImportInfo, ImportKind};
/// use smallvec::smallvec;
///
/// let import = ImportInfo::new("@tanstack/react-query/devtools", ImportKind::Named, smallvec!["Devtools".to_owned()], 1);
/// assert_eq!(import.package_name(), Some("@tanstack/react-query"));
///
/// let local = ImportInfo::new("./UserCard", ImportKind::Default, smallvec!["UserCard".to_owned()], 2);
/// assert!(local.is_local());
/// assert_eq!(local.package_name(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Module specifier exactly as written, e.g. `"../components/UserCard"`.
    pub source: String,

    /// The kind of import statement.
    pub kind: ImportKind,

    /// Local bindings introduced by the import. Empty for side-effect imports.
    pub names: SmallVec<[String; 4]>,

    /// Line of the import statement (1-indexed).
    pub line: u32,
}

impl ImportInfo {
    /// Creates a new import info.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        kind: ImportKind,
        names: SmallVec<[String; 4]>,
        line: u32,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            names,
            line,
        }
    }

    /// Returns `true` if the specifier refers to project code: relative,
    /// absolute, or through a `@/` or `~` alias.
    #[must_use]
    pub fn is_local(&self) -> bool {
        let s = self.source.as_str();
        s.starts_with('.') || s.starts_with('/') || s.starts_with("@/") || s.starts_with('~')
    }

    /// Returns the npm package name for third-party imports.
    ///
    /// Scoped packages keep their scope (`@scope/pkg`); deep imports are cut
    /// back to the package.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        if self.is_local() || self.source.is_empty() {
            return None;
        }
        let s = self.source.as_str();
        let segments = if s.starts_with('@') { 2 } else { 1 };
        let end = s
            .match_indices('/')
            .nth(segments - 1)
            .map_or(s.len(), |(i, _)| i);
        Some(&s[..end])
    }

    /// Returns the last path segment of the specifier with any extension
    /// removed, e.g. `"UserCard"` for `"./components/UserCard.tsx"`.
    #[must_use]
    pub fn module_stem(&self) -> &str {
        let last = self.source.rsplit('/').next().unwrap_or_default();
        last.split('.').next().unwrap_or(last)
    }
}
