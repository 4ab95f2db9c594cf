//! Node and text helpers shared by the extractors.
//!
//! Functions here work on either a syntax node or raw text, so the structured
//! and fallback paths interpret literals, URL templates and type annotations
//! identically.

use tree_sitter::Node;
use xc_core::{FxHashMap, ObservedType};

/// Returns the source text of a node, or `""` if its range is not valid UTF-8.
pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or_default()
}

/// Returns the 1-indexed line a node starts on.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Returns the 1-indexed line of a byte offset in `text`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn line_at(text: &str, offset: usize) -> u32 {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() as u32 + 1
}

/// Visits `root` and every descendant in document order.
///
/// Iterative, so deeply nested sources cannot exhaust the stack.
pub(crate) fn visit<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Iterates the named children of a node.
pub(crate) fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

/// Returns the contents of a quoted string literal without its quotes.
pub(crate) fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'\'' | b'"' | b'`') && bytes[bytes.len() - 1] == bytes[0] {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Returns the last identifier in an expression, e.g. `"id"` for
/// `"user.profile.id"` or `"slug"` for `"params['slug']"`.
pub(crate) fn last_identifier(expr: &str) -> &str {
    expr.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .rfind(|s| !s.is_empty() && !s.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or("param")
}

/// Rewrites every `${expr}` in a template body to `{name}`.
///
/// A substitution at the very start that is directly followed by `/` is a
/// base URL and is dropped: `${API}/users/${id}` becomes `/users/{id}`.
pub(crate) fn normalize_template(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    let mut at_start = true;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(close) = matching_brace(after) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let expr = &after[..close];
        let tail = &after[close + 1..];
        let is_base = at_start && start == 0 && tail.starts_with('/');
        if !is_base {
            out.push('{');
            out.push_str(last_identifier(expr));
            out.push('}');
        }
        at_start = false;
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Finds the `}` closing a `${` opened just before `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Returns `true` if a candidate string looks like a request path or URL.
pub(crate) fn looks_like_url(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.contains(char::is_whitespace)
        && (candidate.starts_with('/') || candidate.starts_with("http") || candidate.contains('/'))
}

/// Resolves an expression node to a URL template.
///
/// Accepts string literals, template strings, `+` concatenations and
/// identifiers bound to a string constant elsewhere in the file. Non-literal
/// parts become `{name}` placeholders.
pub(crate) fn url_from_node(
    node: Node<'_>,
    source: &str,
    constants: &FxHashMap<String, String>,
) -> Option<String> {
    let url = match node.kind() {
        "string" => unquote(node_text(node, source)).to_owned(),
        "template_string" => normalize_template(unquote(node_text(node, source))),
        "identifier" => constants.get(node_text(node, source))?.clone(),
        "binary_expression" => concat_url(node, source, constants)?,
        "parenthesized_expression" => {
            return url_from_node(node.named_child(0)?, source, constants);
        }
        _ => return None,
    };
    looks_like_url(&url).then_some(url)
}

fn concat_url(
    node: Node<'_>,
    source: &str,
    constants: &FxHashMap<String, String>,
) -> Option<String> {
    let mut operands = Vec::new();
    flatten_concat(node, source, &mut operands);
    if !operands.iter().any(|n| matches!(n.kind(), "string" | "template_string")) {
        return None;
    }

    let mut out = String::new();
    for (i, operand) in operands.iter().enumerate() {
        match operand.kind() {
            "string" => out.push_str(unquote(node_text(*operand, source))),
            "template_string" => out.push_str(&normalize_template(unquote(node_text(*operand, source)))),
            _ => {
                let text = node_text(*operand, source);
                if let Some(value) = constants.get(text) {
                    out.push_str(value);
                    continue;
                }
                let next_is_path = operands
                    .get(i + 1)
                    .is_some_and(|n| unquote(node_text(*n, source)).starts_with('/'));
                if i == 0 && next_is_path {
                    continue;
                }
                out.push('{');
                out.push_str(last_identifier(text));
                out.push('}');
            }
        }
    }
    Some(out)
}

fn flatten_concat<'t>(node: Node<'t>, source: &str, out: &mut Vec<Node<'t>>) {
    let is_plus = node.kind() == "binary_expression"
        && node
            .child_by_field_name("operator")
            .is_some_and(|op| node_text(op, source) == "+");
    if !is_plus {
        out.push(node);
        return;
    }
    if let Some(left) = node.child_by_field_name("left") {
        flatten_concat(left, source, out);
    }
    if let Some(right) = node.child_by_field_name("right") {
        flatten_concat(right, source, out);
    }
}

/// Splits a URL into its path and the parameter names of its query string.
pub(crate) fn split_query(url: &str) -> (&str, Vec<&str>) {
    let without_fragment = url.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => {
            let keys = query
                .split('&')
                .filter_map(|pair| pair.split('=').next())
                .filter(|key| !key.is_empty())
                .collect();
            (path, keys)
        }
        None => (without_fragment, Vec::new()),
    }
}

/// Classifies the text of a value expression.
pub(crate) fn classify_value(text: &str) -> ObservedType {
    let text = text.trim();
    match text {
        "true" | "false" => return ObservedType::Boolean,
        "null" | "undefined" => return ObservedType::Null,
        _ => {}
    }
    if text.starts_with(['\'', '"', '`']) {
        return ObservedType::String;
    }
    if text.starts_with('[') {
        return ObservedType::Array;
    }
    if text.starts_with('{') {
        return ObservedType::Object;
    }
    if text.starts_with("new Date") {
        return ObservedType::Date;
    }
    if text.parse::<f64>().is_ok() {
        return ObservedType::Number;
    }
    ObservedType::Unknown
}

/// Splits a type annotation at top-level `|`.
pub(crate) fn split_union(annotation: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in annotation.char_indices() {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            '|' if depth == 0 => {
                parts.push(annotation[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(annotation[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Returns the line-preserving text with `//` and `/* */` comments blanked.
pub(crate) fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' && i + 1 < bytes.len() {
                push_byte(&mut out, text, i);
                push_byte(&mut out, text, i + 1);
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            push_byte(&mut out, text, i);
            i += 1;
            continue;
        }
        match (b, bytes.get(i + 1)) {
            (b'/', Some(b'/')) => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            (b'/', Some(b'*')) => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] == b'\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i += 2;
            }
            _ => {
                if matches!(b, b'\'' | b'"' | b'`') {
                    quote = Some(b);
                }
                push_byte(&mut out, text, i);
                i += 1;
            }
        }
    }
    out
}

fn push_byte(out: &mut String, text: &str, i: usize) {
    if text.is_char_boundary(i) {
        let width = text[i..].chars().next().map_or(1, char::len_utf8);
        if width == 1 {
            out.push(char::from(text.as_bytes()[i]));
        } else {
            out.push_str(&text[i..i + width]);
        }
    }
}
