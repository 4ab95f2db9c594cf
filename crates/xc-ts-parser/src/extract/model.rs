//! Data model extraction from interfaces, object type aliases and classes.

use std::collections::BTreeMap;

use tree_sitter::Node;
use xc_core::{DataModel, ObservedType, Relationship, RelationshipKind, SourceLocation};

use super::{Extractor, SourceUnit};
use crate::error::ParseError;
use crate::fallback::{Patterns, brace_body, patterns, top_level_lines};
use crate::syntax::{
    classify_value, line_at, line_of, named_children, node_text, split_union, unquote, visit,
};

/// Type names that never denote an application model.
const BUILTIN_TYPES: &[&str] = &[
    "String", "Number", "Boolean", "Date", "Object", "Array", "Record", "Map", "Set", "Promise",
    "Partial", "Required", "Readonly", "Pick", "Omit", "Function", "Blob", "File", "FormData",
    "Error", "RegExp", "JSX", "React", "ReactNode", "Element", "HTMLElement", "Event",
];

/// Base classes that make a class a UI component rather than a model.
const COMPONENT_BASES: &[&str] = &["Component", "PureComponent"];

/// A declared object shape before model filtering.
#[derive(Debug, Clone)]
pub(crate) struct Shape {
    pub model: DataModel,
    pub component_class: bool,
}

impl Shape {
    fn new(name: &str) -> Self {
        Self {
            model: DataModel::new(name),
            component_class: false,
        }
    }

    fn extends(&mut self, base: &str) {
        let base = base.split('<').next().unwrap_or(base).trim();
        let leaf = base.rsplit('.').next().unwrap_or(base);
        if COMPONENT_BASES.contains(&leaf) {
            self.component_class = true;
            return;
        }
        if is_model_reference(base) {
            self.model
                .relationships
                .entry(base.to_owned())
                .or_insert_with(Relationship::extends);
        }
    }

    /// Whether this shape should be reported as a model.
    fn is_model(&self) -> bool {
        let name = &self.model.name;
        !self.component_class
            && !name.ends_with("Props")
            && !name.ends_with("State")
            && (!self.model.fields.is_empty() || !self.model.relationships.is_empty())
    }
}

/// Extracts [`DataModel`]s.
#[derive(Debug)]
pub struct ModelExtractor {
    patterns: &'static Patterns,
}

impl Extractor for ModelExtractor {
    type Entity = DataModel;

    fn extract(&self, unit: &SourceUnit<'_>, _context: Option<&str>) -> Vec<DataModel> {
        self.shapes(unit)
            .into_iter()
            .filter(Shape::is_model)
            .map(|shape| shape.model)
            .collect()
    }
}

impl ModelExtractor {
    /// Creates a model extractor.
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            patterns: patterns()?,
        })
    }

    /// Every object shape declared in the file, merged by name and including
    /// props and state declarations.
    pub(crate) fn shapes(&self, unit: &SourceUnit<'_>) -> Vec<Shape> {
        let mut shapes: BTreeMap<String, Shape> = BTreeMap::new();
        let found = match unit.tree {
            Some(tree) => tree_shapes(unit, tree.root_node()),
            None => self.text_shapes(unit),
        };
        for shape in found {
            match shapes.get_mut(&shape.model.name) {
                Some(existing) => {
                    existing.component_class |= shape.component_class;
                    existing.model.merge(shape.model);
                }
                None => {
                    shapes.insert(shape.model.name.clone(), shape);
                }
            }
        }
        shapes.into_values().collect()
    }

    fn text_shapes(&self, unit: &SourceUnit<'_>) -> Vec<Shape> {
        let text = unit.text;
        let mut shapes = Vec::new();
        let headers = [
            (&self.patterns.interface_decl, false),
            (&self.patterns.type_alias_decl, false),
            (&self.patterns.class_decl, true),
        ];
        for (pattern, is_class) in headers {
            for caps in pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                let mut shape = Shape::new(&caps["name"]);
                let line = line_at(text, caps.name("name").map_or(whole.start(), |m| m.start()));
                shape.model.locations.insert(SourceLocation::new(unit.path, line));
                if let Some(ext) = caps.name("ext") {
                    for base in split_top_level(ext.as_str(), ',') {
                        shape.extends(base);
                    }
                }
                let Some((start, end)) = brace_body(text, whole.end()) else {
                    continue;
                };
                for (_, line) in top_level_lines(&text[start..end]) {
                    let Some(member) = self.patterns.member_field.captures(line) else {
                        continue;
                    };
                    // Class bodies also hold statements; only typed or
                    // initialized members count as fields there.
                    let annotation = member.name("ty").map(|m| m.as_str());
                    let value = member.name("val").map(|m| m.as_str());
                    if is_class && annotation.is_none() && value.is_none() {
                        continue;
                    }
                    record_field(
                        &mut shape.model,
                        &member["name"],
                        member.name("opt").is_some(),
                        annotation,
                        value,
                    );
                }
                shapes.push(shape);
            }
        }
        shapes
    }
}

fn tree_shapes(unit: &SourceUnit<'_>, root: Node<'_>) -> Vec<Shape> {
    let text = unit.text;
    let mut shapes = Vec::new();
    visit(root, |node| {
        let shape = match node.kind() {
            "interface_declaration" => interface_shape(node, text),
            "type_alias_declaration" => alias_shape(node, text),
            "class_declaration" | "abstract_class_declaration" => class_shape(node, text),
            _ => None,
        };
        if let Some(mut shape) = shape {
            shape
                .model
                .locations
                .insert(SourceLocation::new(unit.path, line_of(node)));
            shapes.push(shape);
        }
    });
    shapes
}

fn interface_shape(node: Node<'_>, text: &str) -> Option<Shape> {
    let name = node.child_by_field_name("name")?;
    let mut shape = Shape::new(node_text(name, text));
    for child in named_children(node) {
        if child.kind() == "extends_type_clause" {
            for base in named_children(child) {
                shape.extends(node_text(base, text));
            }
        }
    }
    if let Some(body) = node.child_by_field_name("body") {
        signatures(body, text, &mut shape.model);
    }
    Some(shape)
}

fn alias_shape(node: Node<'_>, text: &str) -> Option<Shape> {
    let name = node.child_by_field_name("name")?;
    let value = node.child_by_field_name("value")?;
    let mut shape = Shape::new(node_text(name, text));
    match value.kind() {
        "object_type" => signatures(value, text, &mut shape.model),
        // `type Admin = User & { level: number }`
        "intersection_type" => {
            for part in named_children(value) {
                match part.kind() {
                    "object_type" => signatures(part, text, &mut shape.model),
                    "type_identifier" | "generic_type" | "nested_type_identifier" => {
                        shape.extends(node_text(part, text));
                    }
                    _ => {}
                }
            }
        }
        _ => return None,
    }
    Some(shape)
}

fn class_shape(node: Node<'_>, text: &str) -> Option<Shape> {
    let name = node.child_by_field_name("name")?;
    let mut shape = Shape::new(node_text(name, text));
    for heritage in named_children(node).filter(|c| c.kind() == "class_heritage") {
        for clause in named_children(heritage).filter(|c| c.kind() == "extends_clause") {
            if let Some(value) = clause.child_by_field_name("value") {
                shape.extends(node_text(value, text));
            }
        }
    }
    let body = node.child_by_field_name("body")?;
    for member in named_children(body).filter(|m| m.kind() == "public_field_definition") {
        let Some(field) = member.child_by_field_name("name") else {
            continue;
        };
        let annotation = member
            .child_by_field_name("type")
            .map(|t| annotation_text(t, text));
        let value = member.child_by_field_name("value").map(|v| node_text(v, text));
        record_field(
            &mut shape.model,
            node_text(field, text),
            is_optional(member),
            annotation,
            value,
        );
    }
    Some(shape)
}

/// Records every property signature in an object type or interface body.
fn signatures(body: Node<'_>, text: &str, model: &mut DataModel) {
    for member in named_children(body).filter(|m| m.kind() == "property_signature") {
        let Some(field) = member.child_by_field_name("name") else {
            continue;
        };
        let annotation = member
            .child_by_field_name("type")
            .map(|t| annotation_text(t, text));
        record_field(model, node_text(field, text), is_optional(member), annotation, None);
    }
}

fn is_optional(member: Node<'_>) -> bool {
    (0..member.child_count())
        .filter_map(|i| member.child(i))
        .any(|c| c.kind() == "?")
}

/// The type text of a `type_annotation` node, without its colon.
fn annotation_text<'a>(annotation: Node<'_>, text: &'a str) -> &'a str {
    let raw = node_text(annotation, text).trim_start();
    raw.strip_prefix(':').unwrap_or(raw).trim()
}

/// Records one field on `model`, shared by the structured and text paths.
///
/// A union annotation records one tag per member. Members naming another
/// model become relationships; the field is nullable if it is optional or
/// the union admits `null` or `undefined`.
pub(crate) fn record_field(
    model: &mut DataModel,
    name: &str,
    optional: bool,
    annotation: Option<&str>,
    value: Option<&str>,
) {
    let name = unquote(name);
    model.declared.insert(name.to_owned());
    let Some(annotation) = annotation else {
        let tag = value.map_or(ObservedType::Unknown, classify_value);
        model.add_field(name, tag, !optional);
        return;
    };
    let members = split_union(annotation);
    let nullable = optional || members.iter().any(|m| matches!(*m, "null" | "undefined"));
    if members.is_empty() {
        model.add_field(name, ObservedType::Unknown, !optional);
    }
    for member in members {
        model.add_field(name, ObservedType::from_annotation(member), !optional);
        if let Some((kind, target)) = relation_target(member) {
            model
                .relationships
                .entry(target.to_owned())
                .or_insert_with(|| Relationship::via_field(kind, name, nullable));
        }
    }
}

/// Resolves a union member to the model it links to.
fn relation_target(member: &str) -> Option<(RelationshipKind, &str)> {
    let member = member.trim();
    if let Some(inner) = member.strip_suffix("[]") {
        return is_model_reference(inner).then_some((RelationshipKind::OneToMany, inner));
    }
    if let Some(inner) = member
        .strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let inner = inner.trim();
        return is_model_reference(inner).then_some((RelationshipKind::OneToMany, inner));
    }
    is_model_reference(member).then_some((RelationshipKind::ManyToOne, member))
}

/// A bare PascalCase identifier that is not a built-in type.
fn is_model_reference(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !BUILTIN_TYPES.contains(&name)
}

fn split_top_level(list: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' | '{' | '(' => depth += 1,
            '>' | '}' | ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use camino::Utf8Path;

    use super::*;
    use crate::parser::{SourceKind, TolerantParser};

    const SOURCE: &str = r"
export interface Address {
  street: string;
  city: string;
}

export interface User extends Entity {
  id: number;
  email: string | null;
  nickname?: string;
  address: Address;
  orders: Order[];
  tags: Array<Tag>;
  createdAt: Date;
}

type Order = {
  id: number;
  total: number;
};

export class Product {
  id: number;
  name = 'widget';
  price?: number;
  save() {
    return true;
  }
}

interface CardProps {
  title: string;
}

class Panel extends React.Component {
  state = { open: false };
}
";

    fn models(structured: bool) -> Vec<DataModel> {
        let extractor = ModelExtractor::new().unwrap();
        let mut parser = TolerantParser::new(Duration::from_secs(5), structured).unwrap();
        let tree = parser.parse(SOURCE, SourceKind::TypeScript).ok();
        let unit = SourceUnit {
            path: Utf8Path::new("src/models.ts"),
            text: SOURCE,
            tree: tree.as_ref(),
        };
        extractor.extract(&unit, None)
    }

    fn check(models: &[DataModel]) {
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "Order", "Product", "User"]);

        let user = &models[3];
        assert!(user.fields["email"].contains(&ObservedType::String));
        assert!(user.fields["email"].contains(&ObservedType::Null));
        assert!(user.required.contains("id"));
        assert!(!user.required.contains("nickname"));
        assert!(user.declared.contains("nickname"));
        assert_eq!(user.relationships["Address"].kind, RelationshipKind::ManyToOne);
        assert_eq!(user.relationships["Order"].kind, RelationshipKind::OneToMany);
        assert_eq!(user.relationships["Tag"].kind, RelationshipKind::OneToMany);
        assert_eq!(user.relationships["Entity"].kind, RelationshipKind::Extends);
        assert!(!user.relationships.contains_key("Date"));

        let product = &models[2];
        assert_eq!(product.field_names().collect::<Vec<_>>(), vec!["id", "name", "price"]);
        assert!(product.fields["name"].contains(&ObservedType::String));
    }

    #[test]
    fn test_structured_models() {
        let models = models(true);
        check(&models);
        assert_eq!(models[3].locations.iter().next().map(|l| l.line), Some(7));
    }

    #[test]
    fn test_fallback_models() {
        check(&models(false));
    }

    #[test]
    fn test_nullable_relationship() {
        let mut model = DataModel::new("Post");
        record_field(&mut model, "author", false, Some("User | undefined"), None);
        let rel = &model.relationships["User"];
        assert!(rel.nullable);
        assert_eq!(rel.field.as_deref(), Some("author"));
    }

    #[test]
    fn test_untyped_field_is_unknown() {
        let mut model = DataModel::new("Thing");
        record_field(&mut model, "'quoted-key'", true, None, None);
        assert!(model.fields["quoted-key"].contains(&ObservedType::Unknown));
        assert!(model.required.is_empty());
    }
}
