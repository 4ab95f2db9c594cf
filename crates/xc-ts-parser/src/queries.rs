//! Pre-compiled tree-sitter queries.
//!
//! Queries are compiled once per grammar and cached for the life of the
//! process. Compiled queries are `Sync`, so every worker shares them.

use std::sync::OnceLock;

use tree_sitter::Query;

use crate::error::ParseError;
use crate::parser::SourceKind;

/// Tree-sitter query for import statements.
///
/// # Capture Names
///
/// - `import.source` - The import path string literal
/// - `import.statement` - The full `import_statement` node
/// - `import.named.name` - Named import identifiers
/// - `import.default.name` - Default import identifier
/// - `import.namespace.name` - Namespace import identifier
/// - `import.dynamic.source` - Dynamic import path string
pub const IMPORT_QUERY: &str = r"
(import_statement
  source: (string) @import.source) @import.statement

(import_statement
  (import_clause
    (named_imports
      (import_specifier
        name: (identifier) @import.named.name))))

(import_statement
  (import_clause
    (identifier) @import.default.name))

(import_statement
  (import_clause
    (namespace_import
      (identifier) @import.namespace.name)))

(call_expression
  function: (import)
  arguments: (arguments
    (string) @import.dynamic.source))
";

/// Capture index for `import.source`.
pub const CAPTURE_IMPORT_SOURCE: u32 = 0;

/// Capture index for `import.statement`.
pub const CAPTURE_IMPORT_STATEMENT: u32 = 1;

/// Capture index for `import.named.name`.
pub const CAPTURE_IMPORT_NAMED_NAME: u32 = 2;

/// Capture index for `import.default.name`.
pub const CAPTURE_IMPORT_DEFAULT_NAME: u32 = 3;

/// Capture index for `import.namespace.name`.
pub const CAPTURE_IMPORT_NAMESPACE_NAME: u32 = 4;

/// Capture index for `import.dynamic.source`.
pub const CAPTURE_IMPORT_DYNAMIC_SOURCE: u32 = 5;

static IMPORT_QUERY_TS: OnceLock<Query> = OnceLock::new();
static IMPORT_QUERY_TSX: OnceLock<Query> = OnceLock::new();

/// Returns the compiled import query for a grammar.
pub fn import_query(kind: SourceKind) -> Result<&'static Query, ParseError> {
    let cell = match kind {
        SourceKind::TypeScript => &IMPORT_QUERY_TS,
        SourceKind::Tsx => &IMPORT_QUERY_TSX,
    };
    if let Some(query) = cell.get() {
        return Ok(query);
    }
    let query = compile_query(kind, IMPORT_QUERY)?;
    Ok(cell.get_or_init(|| query))
}

fn compile_query(kind: SourceKind, source: &str) -> Result<Query, ParseError> {
    Query::new(&kind.language(), source).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        kind: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_compiles_for_both_grammars() {
        assert!(import_query(SourceKind::TypeScript).is_ok());
        assert!(import_query(SourceKind::Tsx).is_ok());
    }

    #[test]
    fn test_capture_indices_match_names() {
        let query = import_query(SourceKind::TypeScript).expect("Query should compile");
        let names = query.capture_names();
        assert_eq!(names[CAPTURE_IMPORT_SOURCE as usize], "import.source");
        assert_eq!(names[CAPTURE_IMPORT_STATEMENT as usize], "import.statement");
        assert_eq!(names[CAPTURE_IMPORT_NAMED_NAME as usize], "import.named.name");
        assert_eq!(names[CAPTURE_IMPORT_DEFAULT_NAME as usize], "import.default.name");
        assert_eq!(names[CAPTURE_IMPORT_NAMESPACE_NAME as usize], "import.namespace.name");
        assert_eq!(names[CAPTURE_IMPORT_DYNAMIC_SOURCE as usize], "import.dynamic.source");
    }

    #[test]
    fn test_query_pattern_count() {
        let query = import_query(SourceKind::Tsx).expect("Query should compile");
        assert_eq!(query.pattern_count(), 5);
    }
}
