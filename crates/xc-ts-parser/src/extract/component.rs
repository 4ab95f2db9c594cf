//! UI component extraction.
//!
//! A component file yields at most one [`Component`]: its name, props, state,
//! hooks, imports and complexity score. Endpoint links are filled in by
//! [`FileExtractor`](super::FileExtractor) once endpoints are known.

use camino::Utf8Path;
use smallvec::SmallVec;
use tree_sitter::{Node, Query};
use xc_core::{Component, FieldTypes, ImportInfo, ImportKind, ObservedType, observe};

use super::complexity::complexity_score;
use super::model::ModelExtractor;
use super::{Extractor, SourceUnit};
use crate::error::ParseError;
use crate::fallback::{Patterns, patterns};
use crate::import::extract_imports;
use crate::naming::{is_pascal_case, to_pascal_case};
use crate::parser::SourceKind;
use crate::queries::import_query;
use crate::syntax::{
    classify_value, line_at, named_children, node_text, split_union, unquote, visit,
};

const COMPONENT_EXTENSIONS: &[&str] = &["jsx", "tsx"];

/// Extracts [`Component`]s.
#[derive(Debug)]
pub struct ComponentExtractor {
    patterns: &'static Patterns,
    typescript_imports: &'static Query,
    tsx_imports: &'static Query,
    shapes: ModelExtractor,
}

impl Extractor for ComponentExtractor {
    type Entity = Component;

    fn extract(&self, unit: &SourceUnit<'_>, _context: Option<&str>) -> Vec<Component> {
        if !self.is_component_file(unit) {
            return Vec::new();
        }
        let name = self.component_name(unit);
        let mut component = Component::new(name, unit.path);
        let declared = self.declared_props(unit, &component.name);

        match unit.tree {
            Some(tree) => {
                let root = tree.root_node();
                let query = match tree.kind() {
                    SourceKind::TypeScript => self.typescript_imports,
                    SourceKind::Tsx => self.tsx_imports,
                };
                for import in extract_imports(tree, unit.text, query) {
                    component.add_import(import);
                }
                tree_props(root, unit.text, &mut component, declared);
                tree_state(root, unit.text, &mut component.state);
                tree_hooks(root, unit.text, &mut component);
            }
            None => {
                for import in self.text_imports(unit.text) {
                    component.add_import(import);
                }
                self.text_props(unit.text, &mut component, declared);
                self.text_state(unit.text, &mut component.state);
                self.text_hooks(unit.text, &mut component);
            }
        }

        // Patterns are compiled in `new`, so scoring cannot fail here.
        component.complexity = complexity_score(unit.text).unwrap_or_default();
        vec![component]
    }
}

impl ComponentExtractor {
    /// Creates a component extractor, compiling its queries and patterns.
    pub fn new() -> Result<Self, ParseError> {
        complexity_score("")?;
        Ok(Self {
            patterns: patterns()?,
            typescript_imports: import_query(SourceKind::TypeScript)?,
            tsx_imports: import_query(SourceKind::Tsx)?,
            shapes: ModelExtractor::new()?,
        })
    }

    /// JSX/TSX files always define a component. Other files do if they
    /// return JSX, or call hooks and export a PascalCase declaration.
    fn is_component_file(&self, unit: &SourceUnit<'_>) -> bool {
        if unit
            .path
            .extension()
            .is_some_and(|ext| COMPONENT_EXTENSIONS.contains(&ext))
        {
            return true;
        }
        let has_jsx = match unit.tree {
            Some(tree) => {
                let mut found = false;
                visit(tree.root_node(), |node| {
                    found |= matches!(
                        node.kind(),
                        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment"
                    );
                });
                found
            }
            None => self.patterns.jsx_return.is_match(unit.text),
        };
        has_jsx
            || (self.patterns.hook_call.is_match(unit.text) && self.exported_name(unit).is_some())
    }

    fn component_name(&self, unit: &SourceUnit<'_>) -> String {
        self.exported_name(unit)
            .unwrap_or_else(|| file_component_name(unit.path))
    }

    /// The exported PascalCase declaration, preferring the default export.
    fn exported_name(&self, unit: &SourceUnit<'_>) -> Option<String> {
        let mut named: Option<String> = None;
        match unit.tree {
            Some(tree) => {
                let mut default: Option<String> = None;
                visit(tree.root_node(), |node| {
                    if node.kind() != "export_statement" {
                        return;
                    }
                    let Some(name) = exported_declaration(node, unit.text) else {
                        return;
                    };
                    if !is_pascal_case(&name) {
                        return;
                    }
                    let is_default = (0..node.child_count())
                        .filter_map(|i| node.child(i))
                        .any(|c| c.kind() == "default");
                    if is_default {
                        default.get_or_insert(name);
                    } else {
                        named.get_or_insert(name);
                    }
                });
                default.or(named)
            }
            None => {
                if let Some(caps) = self.patterns.default_export.captures(unit.text) {
                    return Some(caps["name"].to_owned());
                }
                for caps in self.patterns.exported_decl.captures_iter(unit.text) {
                    let name = &caps["name"];
                    if !is_pascal_case(name) {
                        continue;
                    }
                    if caps.name("default").is_some() {
                        return Some(name.to_owned());
                    }
                    named.get_or_insert_with(|| name.to_owned());
                }
                named
            }
        }
    }

    /// Fields of the props type: the annotated type if it is declared in
    /// the file, else `<Name>Props`.
    fn declared_props(&self, unit: &SourceUnit<'_>, name: &str) -> FieldTypes {
        let shapes = self.shapes.shapes(unit);
        let annotated = props_annotation(unit, name);
        let conventional = format!("{name}Props");
        let pick = |wanted: &str| {
            shapes
                .iter()
                .find(|s| s.model.name == wanted)
                .map(|s| s.model.fields.clone())
        };
        annotated
            .as_deref()
            .and_then(pick)
            .or_else(|| pick(&conventional))
            .unwrap_or_default()
    }

    fn text_imports(&self, text: &str) -> Vec<ImportInfo> {
        let mut found: Vec<(usize, ImportInfo)> = Vec::new();
        for caps in self.patterns.import_static.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let (kind, names) = parse_import_clause(&caps["clause"]);
            let kind = if caps.name("type").is_some() {
                ImportKind::TypeOnly
            } else {
                kind
            };
            let line = line_at(text, whole.start() + leading_blank(whole.as_str()));
            found.push((whole.start(), ImportInfo::new(&caps["src"], kind, names, line)));
        }
        for caps in self.patterns.import_side_effect.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let line = line_at(text, whole.start() + leading_blank(whole.as_str()));
            let import = ImportInfo::new(&caps["src"], ImportKind::SideEffect, SmallVec::new(), line);
            found.push((whole.start(), import));
        }
        for caps in self.patterns.import_dynamic.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let line = line_at(text, whole.start());
            let import = ImportInfo::new(&caps["src"], ImportKind::Dynamic, SmallVec::new(), line);
            found.push((whole.start(), import));
        }
        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, import)| import).collect()
    }

    fn text_props(&self, text: &str, component: &mut Component, declared: FieldTypes) {
        let mut props = declared;
        let matching = self
            .patterns
            .destructured_props
            .captures_iter(text)
            .find(|caps| {
                caps.name("fname")
                    .or_else(|| caps.name("cname"))
                    .is_some_and(|m| m.as_str() == component.name)
            })
            .or_else(|| self.patterns.destructured_props.captures(text));
        if let Some(caps) = matching {
            for entry in caps["props"].split(',') {
                let entry = entry.trim();
                if entry.is_empty() || entry.starts_with("...") {
                    continue;
                }
                let (name, default) = match entry.split_once('=') {
                    Some((name, value)) => (name.trim(), Some(value.trim())),
                    None => (entry.split(':').next().unwrap_or(entry).trim(), None),
                };
                add_prop(&mut props, name, default);
            }
        }
        for caps in self.patterns.props_access.captures_iter(text) {
            add_prop(&mut props, &caps["name"], None);
        }
        component.props = props;
    }

    fn text_state(&self, text: &str, state: &mut FieldTypes) {
        for caps in self.patterns.use_state.captures_iter(text) {
            let name = &caps["name"];
            match caps.name("ty") {
                Some(ty) => {
                    for member in split_union(ty.as_str()) {
                        observe(state, name, ObservedType::from_annotation(member));
                    }
                }
                None => observe(state, name, initial_state_type(&caps["init"])),
            }
        }
    }

    fn text_hooks(&self, text: &str, component: &mut Component) {
        for caps in self.patterns.hook_call.captures_iter(text) {
            let Some(hook) = caps.name("hook") else { continue };
            let before = text[..hook.start()].trim_end();
            if before.ends_with("function") {
                continue;
            }
            if before.ends_with('.') && !before.ends_with("React.") {
                continue;
            }
            component.add_hook(hook.as_str());
        }
    }
}

/// The component name a file implies when it exports no PascalCase
/// declaration.
///
/// `UserCard.test.tsx` names `UserCard`; `index.tsx` takes its directory name.
#[must_use]
pub fn file_component_name(path: &Utf8Path) -> String {
    let file = path.file_name().unwrap_or_default();
    let stem = file.split('.').next().unwrap_or(file);
    let stem = if stem == "index" {
        path.parent()
            .and_then(Utf8Path::file_name)
            .unwrap_or(stem)
    } else {
        stem
    };
    to_pascal_case(stem)
}

/// The name an `export` statement declares, if any.
fn exported_declaration(export: Node<'_>, text: &str) -> Option<String> {
    if let Some(declaration) = export.child_by_field_name("declaration") {
        let name = match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => named_children(declaration)
                .find(|c| c.kind() == "variable_declarator")?
                .child_by_field_name("name")?,
            _ => declaration.child_by_field_name("name")?,
        };
        return Some(node_text(name, text).to_owned());
    }
    let value = export.child_by_field_name("value")?;
    match value.kind() {
        "identifier" => Some(node_text(value, text).to_owned()),
        // `export default memo(Card)`
        "call_expression" => {
            let arg = value
                .child_by_field_name("arguments")
                .and_then(|a| named_children(a).next())
                .filter(|a| a.kind() == "identifier")?;
            Some(node_text(arg, text).to_owned())
        }
        "function_expression" | "class" => value
            .child_by_field_name("name")
            .map(|n| node_text(n, text).to_owned()),
        _ => None,
    }
}

/// The props type named on the component's first parameter or on an
/// `FC<Props>` declarator annotation.
fn props_annotation(unit: &SourceUnit<'_>, name: &str) -> Option<String> {
    let tree = unit.tree?;
    let text = unit.text;
    let mut annotation: Option<String> = None;
    visit(tree.root_node(), |node| {
        if annotation.is_some() {
            return;
        }
        if node.kind() == "variable_declarator"
            && node
                .child_by_field_name("name")
                .is_some_and(|n| node_text(n, text) == name)
        {
            if let Some(ty) = node.child_by_field_name("type") {
                let ty = node_text(ty, text);
                if let (Some(open), Some(close)) = (ty.find('<'), ty.rfind('>')) {
                    if open < close {
                        annotation = Some(ty[open + 1..close].trim().to_owned());
                        return;
                    }
                }
            }
        }
        let Some(function) = component_function(node, text, name) else {
            return;
        };
        annotation = first_parameter(function)
            .and_then(|p| p.child_by_field_name("type"))
            .map(|t| type_name(node_text(t, text)).to_owned())
            .filter(|t| !t.is_empty());
    });
    annotation
}

/// If `node` defines the component function called `name`, returns the
/// function node.
fn component_function<'t>(node: Node<'t>, text: &str, name: &str) -> Option<Node<'t>> {
    match node.kind() {
        "function_declaration" => {
            let declared = node.child_by_field_name("name")?;
            (node_text(declared, text) == name).then_some(node)
        }
        "variable_declarator" => {
            let declared = node.child_by_field_name("name")?;
            if node_text(declared, text) != name {
                return None;
            }
            let mut value = node.child_by_field_name("value")?;
            // memo(...) / forwardRef(...)
            while value.kind() == "call_expression" {
                value = value
                    .child_by_field_name("arguments")
                    .and_then(|a| named_children(a).next())?;
            }
            matches!(value.kind(), "arrow_function" | "function_expression" | "function")
                .then_some(value)
        }
        _ => None,
    }
}

fn first_parameter(function: Node<'_>) -> Option<Node<'_>> {
    match function.child_by_field_name("parameters") {
        Some(list) => named_children(list).next(),
        None => function.child_by_field_name("parameter"),
    }
}

/// `": CardProps"` or `": Readonly<CardProps>"` becomes `"CardProps"`.
fn type_name(annotation: &str) -> &str {
    let text = annotation.trim_start().trim_start_matches(':').trim();
    let inner = match (text.find('<'), text.rfind('>')) {
        (Some(open), Some(close)) if open < close => &text[open + 1..close],
        _ => text,
    };
    let inner = inner.trim();
    if inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        inner
    } else {
        ""
    }
}

fn tree_props(root: Node<'_>, text: &str, component: &mut Component, declared: FieldTypes) {
    let mut props = declared;
    let mut function: Option<Node<'_>> = None;
    visit(root, |node| {
        if function.is_none() {
            function = component_function(node, text, &component.name);
        }
    });

    if let Some(param) = function.and_then(first_parameter) {
        let pattern = param.child_by_field_name("pattern").unwrap_or(param);
        match pattern.kind() {
            "object_pattern" => {
                for child in named_children(pattern) {
                    match child.kind() {
                        "shorthand_property_identifier_pattern" => {
                            add_prop(&mut props, node_text(child, text), None);
                        }
                        "object_assignment_pattern" => {
                            if let Some(left) = child.child_by_field_name("left") {
                                let default = child
                                    .child_by_field_name("right")
                                    .map(|r| node_text(r, text));
                                add_prop(&mut props, node_text(left, text), default);
                            }
                        }
                        "pair_pattern" => {
                            if let Some(key) = child.child_by_field_name("key") {
                                add_prop(&mut props, unquote(node_text(key, text)), None);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "identifier" => {
                let binding = node_text(pattern, text);
                if let Some(function) = function {
                    visit(function, |node| {
                        if node.kind() != "member_expression" {
                            return;
                        }
                        let is_props = node
                            .child_by_field_name("object")
                            .is_some_and(|o| node_text(o, text) == binding);
                        if let (true, Some(property)) =
                            (is_props, node.child_by_field_name("property"))
                        {
                            add_prop(&mut props, node_text(property, text), None);
                        }
                    });
                }
            }
            _ => {}
        }
    }
    component.props = props;
}

fn tree_state(root: Node<'_>, text: &str, state: &mut FieldTypes) {
    visit(root, |node| {
        if node.kind() != "variable_declarator" {
            return;
        }
        let (Some(name), Some(value)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("value"),
        ) else {
            return;
        };
        if name.kind() != "array_pattern" || value.kind() != "call_expression" {
            return;
        }
        let is_use_state = value
            .child_by_field_name("function")
            .is_some_and(|f| matches!(node_text(f, text), "useState" | "React.useState"));
        if !is_use_state {
            return;
        }
        let Some(binding) = named_children(name)
            .next()
            .filter(|b| b.kind() == "identifier")
        else {
            return;
        };
        let binding = node_text(binding, text);

        if let Some(arguments) = value.child_by_field_name("type_arguments") {
            let raw = node_text(arguments, text);
            let inner = raw
                .strip_prefix('<')
                .and_then(|r| r.strip_suffix('>'))
                .unwrap_or(raw);
            for member in split_union(inner) {
                observe(state, binding, ObservedType::from_annotation(member));
            }
            return;
        }
        let initial = value
            .child_by_field_name("arguments")
            .and_then(|a| named_children(a).next())
            .map_or("", |a| node_text(a, text));
        observe(state, binding, initial_state_type(initial));
    });
}

fn tree_hooks(root: Node<'_>, text: &str, component: &mut Component) {
    visit(root, |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let hook = match function.kind() {
            "identifier" => node_text(function, text),
            "member_expression" => {
                let is_react = function
                    .child_by_field_name("object")
                    .is_some_and(|o| node_text(o, text) == "React");
                match function.child_by_field_name("property") {
                    Some(property) if is_react => node_text(property, text),
                    _ => return,
                }
            }
            _ => return,
        };
        if is_hook_name(hook) {
            component.add_hook(hook);
        }
    });
}

fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
}

fn initial_state_type(initial: &str) -> ObservedType {
    if initial.trim().is_empty() {
        ObservedType::Unknown
    } else {
        classify_value(initial)
    }
}

/// Adds a prop unless its type is already declared.
fn add_prop(props: &mut FieldTypes, name: &str, default: Option<&str>) {
    let name = name.trim();
    if name.is_empty() || props.contains_key(name) {
        return;
    }
    let tag = default.map_or(ObservedType::Unknown, classify_value);
    observe(props, name, tag);
}

/// Splits an import clause into its kind and bound names.
fn parse_import_clause(clause: &str) -> (ImportKind, SmallVec<[String; 4]>) {
    let clause = clause.trim();
    let mut names: SmallVec<[String; 4]> = SmallVec::new();
    if let Some(star) = clause.find('*') {
        let default = clause[..star].trim().trim_end_matches(',').trim();
        if !default.is_empty() {
            names.push(default.to_owned());
        }
        if let Some((_, alias)) = clause[star..].split_once(" as ") {
            names.push(alias.trim().to_owned());
        }
        return (ImportKind::Namespace, names);
    }
    let (default, named) = match clause.find('{') {
        Some(open) => (&clause[..open], Some(&clause[open + 1..])),
        None => (clause, None),
    };
    let default = default.trim().trim_end_matches(',').trim();
    if !default.is_empty() {
        names.push(default.to_owned());
    }
    if let Some(named) = named {
        let named = named.split('}').next().unwrap_or(named);
        for entry in named.split(',') {
            let entry = entry.trim().trim_start_matches("type ").trim();
            let imported = entry.split_whitespace().next().unwrap_or(entry);
            if !imported.is_empty() {
                names.push(imported.to_owned());
            }
        }
    }
    let kind = if default.is_empty() {
        ImportKind::Named
    } else {
        ImportKind::Default
    };
    (kind, names)
}

fn leading_blank(matched: &str) -> usize {
    matched.len() - matched.trim_start().len()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::parser::TolerantParser;

    const CARD: &str = r"
import React, { useState, useEffect } from 'react';
import { format } from 'date-fns';
import { api } from '../services/api';
import './UserCard.css';

interface UserCardProps {
  userId: number;
  compact?: boolean;
}

export default function UserCard({ userId, compact = false, onSelect }: UserCardProps) {
  const [user, setUser] = useState<User | null>(null);
  const [count, setCount] = useState(0);
  useEffect(() => {
    api.get(`/api/users/${userId}`).then(setUser);
  }, [userId]);
  if (!user) {
    return null;
  }
  return (
    <div onClick={() => onSelect(user)}>
      {compact ? user.name : format(user.createdAt, 'PP')}
    </div>
  );
}
";

    fn extract_at(path: &str, source: &str, structured: bool) -> Vec<Component> {
        let extractor = ComponentExtractor::new().unwrap();
        let path = Utf8Path::new(path);
        let mut parser = TolerantParser::new(Duration::from_secs(5), structured).unwrap();
        let tree = parser.parse(source, SourceKind::from_path(path)).ok();
        let unit = SourceUnit {
            path,
            text: source,
            tree: tree.as_ref(),
        };
        extractor.extract(&unit, None)
    }

    fn check(component: &Component) {
        assert_eq!(component.name, "UserCard");
        assert!(component.props["userId"].contains(&ObservedType::Number));
        assert!(component.props["compact"].contains(&ObservedType::Boolean));
        assert!(component.props.contains_key("onSelect"));

        assert!(component.state["user"].contains(&ObservedType::Reference("User".to_owned())));
        assert!(component.state["user"].contains(&ObservedType::Null));
        assert!(component.state["count"].contains(&ObservedType::Number));

        assert_eq!(component.hooks, vec!["useState", "useEffect"]);
        let sources: Vec<_> = component.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["react", "date-fns", "../services/api", "./UserCard.css"]);
        assert_eq!(component.imports[0].kind, ImportKind::Default);
        assert_eq!(component.imports[3].kind, ImportKind::SideEffect);
        assert!(component.libraries.contains("react"));
        assert!(component.libraries.contains("date-fns"));
        assert_eq!(component.libraries.len(), 2);
        assert!(component.complexity > 0);
    }

    #[test]
    fn test_component_structured() {
        let components = extract_at("src/components/UserCard.tsx", CARD, true);
        assert_eq!(components.len(), 1);
        check(&components[0]);
    }

    #[test]
    fn test_component_fallback() {
        let components = extract_at("src/components/UserCard.tsx", CARD, false);
        assert_eq!(components.len(), 1);
        check(&components[0]);
    }

    #[test]
    fn test_index_file_takes_directory_name() {
        let source = "export default () => <div />;\n";
        let components = extract_at("src/user-profile/index.jsx", source, true);
        assert_eq!(components[0].name, "UserProfile");
    }

    #[test]
    fn test_plain_module_is_not_a_component() {
        let source = "export function add(a: number, b: number) { return a + b; }\n";
        assert!(extract_at("src/math.ts", source, true).is_empty());
        assert!(extract_at("src/math.ts", source, false).is_empty());
    }

    #[test]
    fn test_js_file_returning_jsx_is_a_component() {
        let source = "export const Badge = ({ label }) => <span>{label}</span>;\n";
        let components = extract_at("src/Badge.js", source, true);
        assert_eq!(components[0].name, "Badge");
        assert!(components[0].props.contains_key("label"));
    }

    #[test]
    fn test_props_object_access() {
        let source = "export function Title(props) {\n  return <h1>{props.text}</h1>;\n}\n";
        let components = extract_at("src/Title.jsx", source, true);
        assert!(components[0].props.contains_key("text"));
    }

    #[test]
    fn test_parse_import_clause() {
        let (kind, names) = parse_import_clause("React, { useState, useMemo as memo }");
        assert_eq!(kind, ImportKind::Default);
        assert_eq!(names.as_slice(), ["React", "useState", "useMemo"]);

        let (kind, names) = parse_import_clause("* as api");
        assert_eq!(kind, ImportKind::Namespace);
        assert_eq!(names.as_slice(), ["api"]);
    }

    #[test]
    fn test_file_component_name() {
        assert_eq!(file_component_name(Utf8Path::new("src/user-card.component.tsx")), "UserCard");
        assert_eq!(file_component_name(Utf8Path::new("src/Nav/index.tsx")), "Nav");
    }
}
