//! Import extraction using the pre-compiled import query.

use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};
use xc_core::{ImportInfo, ImportKind};

use crate::parser::ParseTree;
use crate::queries::{
    CAPTURE_IMPORT_DEFAULT_NAME, CAPTURE_IMPORT_DYNAMIC_SOURCE, CAPTURE_IMPORT_NAMED_NAME,
    CAPTURE_IMPORT_NAMESPACE_NAME, CAPTURE_IMPORT_SOURCE,
};
use crate::syntax::{line_of, node_text, unquote};

/// Extracts every import from a parsed tree, ordered by position.
///
/// Captures belonging to one `import` statement are grouped by the
/// statement's byte range and assembled into a single [`ImportInfo`].
pub fn extract_imports(tree: &ParseTree, source: &str, query: &Query) -> Vec<ImportInfo> {
    let mut cursor = QueryCursor::new();
    let mut statements: FxHashMap<(usize, usize), ImportBuilder> = FxHashMap::default();
    let mut dynamic: Vec<(usize, ImportInfo)> = Vec::new();

    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());
    while let Some(match_) = matches.next() {
        for capture in match_.captures {
            let node = capture.node;
            match capture.index {
                CAPTURE_IMPORT_DYNAMIC_SOURCE => {
                    let import = ImportInfo::new(
                        unquote(node_text(node, source)),
                        ImportKind::Dynamic,
                        smallvec![],
                        line_of(node),
                    );
                    dynamic.push((node.start_byte(), import));
                }
                index => {
                    let Some(statement) = enclosing_statement(node) else {
                        continue;
                    };
                    let builder = statements
                        .entry((statement.start_byte(), statement.end_byte()))
                        .or_insert_with(|| ImportBuilder::new(statement, source));
                    let text = node_text(node, source);
                    match index {
                        CAPTURE_IMPORT_SOURCE => builder.source = Some(unquote(text).to_owned()),
                        CAPTURE_IMPORT_NAMED_NAME => builder.add_name(text, ImportKind::Named),
                        CAPTURE_IMPORT_DEFAULT_NAME => builder.set_kind(text, ImportKind::Default),
                        CAPTURE_IMPORT_NAMESPACE_NAME => {
                            builder.set_kind(text, ImportKind::Namespace);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    let mut imports: Vec<(usize, ImportInfo)> = statements
        .into_iter()
        .filter_map(|((start, _), builder)| builder.build().map(|i| (start, i)))
        .collect();
    imports.extend(dynamic);
    imports.sort_by_key(|(start, _)| *start);
    imports.into_iter().map(|(_, import)| import).collect()
}

struct ImportBuilder {
    source: Option<String>,
    names: SmallVec<[String; 4]>,
    kind: Option<ImportKind>,
    line: u32,
    type_only: bool,
}

impl ImportBuilder {
    fn new(statement: Node<'_>, source: &str) -> Self {
        Self {
            source: None,
            names: smallvec![],
            kind: None,
            line: line_of(statement),
            type_only: node_text(statement, source)
                .trim_start()
                .starts_with("import type"),
        }
    }

    fn add_name(&mut self, name: &str, kind: ImportKind) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_owned());
        }
        self.kind.get_or_insert(kind);
    }

    fn set_kind(&mut self, name: &str, kind: ImportKind) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_owned());
        }
        self.kind = Some(kind);
    }

    fn build(self) -> Option<ImportInfo> {
        let source = self.source?;
        let kind = if self.type_only {
            ImportKind::TypeOnly
        } else if let Some(kind) = self.kind {
            kind
        } else {
            ImportKind::SideEffect
        };
        Some(ImportInfo::new(source, kind, self.names, self.line))
    }
}

fn enclosing_statement(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.kind() == "import_statement" {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::parser::{SourceKind, TolerantParser};
    use crate::queries::import_query;

    fn imports_of(source: &str) -> Vec<ImportInfo> {
        let mut parser = TolerantParser::new(Duration::from_secs(5), true).expect("parser");
        let tree = parser.parse(source, SourceKind::Tsx).expect("Parse failed");
        let query = import_query(SourceKind::Tsx).expect("query");
        extract_imports(&tree, source, query)
    }

    #[test]
    fn test_extract_all_kinds_in_order() {
        let source = r#"
import React, { useState } from 'react';
import * as api from './api';
import './styles.css';
import type { User } from '../types';
const Lazy = () => import('./Lazy');
"#;
        let imports = imports_of(source);
        let sources: Vec<_> = imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["react", "./api", "./styles.css", "../types", "./Lazy"]);

        assert_eq!(imports[0].kind, ImportKind::Default);
        assert!(imports[0].names.contains(&"React".to_owned()));
        assert!(imports[0].names.contains(&"useState".to_owned()));
        assert_eq!(imports[1].kind, ImportKind::Namespace);
        assert_eq!(imports[2].kind, ImportKind::SideEffect);
        assert_eq!(imports[3].kind, ImportKind::TypeOnly);
        assert_eq!(imports[4].kind, ImportKind::Dynamic);
        assert_eq!(imports[4].line, 6);
    }

    #[test]
    fn test_named_imports() {
        let imports = imports_of("import { Foo, Bar } from \"./models\";");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::Named);
        assert_eq!(imports[0].names.len(), 2);
        assert_eq!(imports[0].source, "./models");
    }

    #[test]
    fn test_no_imports() {
        assert!(imports_of("const x = 1;").is_empty());
    }
}
