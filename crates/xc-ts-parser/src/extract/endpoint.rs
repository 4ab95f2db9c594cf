//! API endpoint extraction.
//!
//! Usage-side files call endpoints (`axios.get('/users')`, `fetch(url, opts)`),
//! declaration-side files register them (`router.post('/users', handler)`).
//! Both shapes are recognized here; [`ExtractionRules`] decides which
//! receivers and callees count.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;
use xc_core::{
    ApiEndpoint, EndpointKey, FxHashMap, HttpMethod, ObservedType, SourceLocation, fx_hash_map,
    observe,
};

use super::{Extractor, SourceUnit};
use crate::error::ParseError;
use crate::fallback::{Patterns, paren_body, patterns, quoted_arg};
use crate::naming::resource_to_model_name;
use crate::rules::{ExtractionRules, carries_credentials, is_auth_url};
use crate::syntax::{
    classify_value, line_at, line_of, looks_like_url, named_children, node_text, split_query,
    unquote, url_from_node, visit,
};

/// Response members that describe the transport rather than the payload.
const TRANSPORT_MEMBERS: &[&str] = &[
    "json", "text", "then", "catch", "finally", "status", "statusText", "ok", "headers", "data",
    "length", "map", "filter", "forEach", "find", "some", "every", "reduce", "slice", "push",
    "toString", "blob", "config",
];

/// Node kinds that introduce a function scope.
const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "arrow_function",
    "method_definition",
    "generator_function_declaration",
];

/// Extracts [`ApiEndpoint`]s.
#[derive(Debug)]
pub struct EndpointExtractor {
    rules: ExtractionRules,
    patterns: &'static Patterns,
}

impl Extractor for EndpointExtractor {
    type Entity = ApiEndpoint;

    /// `context` is the name of the component the file defines, if any.
    fn extract(&self, unit: &SourceUnit<'_>, context: Option<&str>) -> Vec<ApiEndpoint> {
        let mut found = Found::default();
        match unit.tree {
            Some(tree) => self.from_tree(unit, tree.root_node(), context, &mut found),
            None => self.from_text(unit, context, &mut found),
        }
        found.into_vec()
    }
}

impl EndpointExtractor {
    /// Creates an extractor for the given rules.
    pub fn new(rules: ExtractionRules) -> Result<Self, ParseError> {
        Ok(Self {
            rules,
            patterns: patterns()?,
        })
    }

    /// Returns the rules this extractor applies.
    #[must_use]
    pub const fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// String constants that look like URLs, by binding name.
    fn constants(&self, text: &str) -> FxHashMap<String, String> {
        let mut constants = fx_hash_map();
        for caps in self.patterns.string_constant.captures_iter(text) {
            let Some(value) = quoted_arg(&caps) else {
                continue;
            };
            if looks_like_url(&value) {
                constants.insert(caps["name"].to_owned(), value);
            }
        }
        constants
    }

    fn from_tree(
        &self,
        unit: &SourceUnit<'_>,
        root: Node<'_>,
        context: Option<&str>,
        found: &mut Found,
    ) {
        let text = unit.text;
        let constants = self.constants(text);
        visit(root, |node| {
            if node.kind() != "call_expression" {
                return;
            }
            let Some(site) = self.call_site(node, text, &constants) else {
                return;
            };
            let mut endpoint = new_endpoint(site.method, &site.url, unit, line_of(node), context);
            endpoint.requires_auth |= carries_credentials(node_text(site.arguments, text));
            if let Some(body) = site.body {
                body_params(body, text, &mut endpoint);
            }
            if let Some(options) = site.options {
                option_params(options, text, &mut endpoint);
            }
            for handler in &site.handlers {
                handler_shape(*handler, text, &mut endpoint);
            }
            response_fields(node, text, &mut endpoint.response_fields);
            infer_request_model(&mut endpoint);
            found.add(endpoint);
        });
    }

    fn call_site<'t>(
        &self,
        node: Node<'t>,
        text: &str,
        constants: &FxHashMap<String, String>,
    ) -> Option<CallSite<'t>> {
        let function = node.child_by_field_name("function")?;
        let arguments = node
            .child_by_field_name("arguments")
            .filter(|a| a.kind() == "arguments")?;
        let args: Vec<Node<'t>> = named_children(arguments)
            .filter(|n| n.kind() != "comment")
            .collect();

        match function.kind() {
            "identifier" => {
                if !self.rules.is_direct_call(node_text(function, text)) {
                    return None;
                }
                let first = *args.first()?;
                // axios({ url, method, data })
                let (url_node, options) = if first.kind() == "object" {
                    (object_value(first, text, "url")?, Some(first))
                } else {
                    (first, args.get(1).copied().filter(|n| n.kind() == "object"))
                };
                let url = url_from_node(url_node, text, constants)?;
                let method = options
                    .and_then(|o| object_value(o, text, "method"))
                    .and_then(|v| unquote(node_text(v, text)).parse().ok())
                    .unwrap_or_default();
                let body = options.and_then(|o| {
                    object_value(o, text, "body").or_else(|| object_value(o, text, "data"))
                });
                Some(CallSite {
                    method,
                    url,
                    arguments,
                    body,
                    options,
                    handlers: Vec::new(),
                })
            }
            "member_expression" => {
                let property = node_text(function.child_by_field_name("property")?, text);
                if !self.rules.is_method(property) {
                    return None;
                }
                let method: HttpMethod = property.parse().ok()?;
                let object = function.child_by_field_name("object")?;

                let (url, rest) = if self.rules.is_receiver(node_text(object, text)) {
                    (url_from_node(*args.first()?, text, constants)?, &args[1..])
                } else {
                    (self.route_url(object, text, constants)?, &args[..])
                };

                let (handlers, values): (Vec<Node<'t>>, Vec<Node<'t>>) =
                    rest.iter().partition(|n| FUNCTION_KINDS.contains(&n.kind()));
                let (body, options) = if method.has_body() {
                    (values.first().copied(), values.get(1).copied())
                } else {
                    (None, values.first().copied())
                };
                Some(CallSite {
                    method,
                    url,
                    arguments,
                    body,
                    options,
                    handlers,
                })
            }
            _ => None,
        }
    }

    /// Resolves `router.route('/x')` at the head of a `.get(...).post(...)` chain.
    fn route_url(
        &self,
        mut object: Node<'_>,
        text: &str,
        constants: &FxHashMap<String, String>,
    ) -> Option<String> {
        loop {
            if object.kind() != "call_expression" {
                return None;
            }
            let function = object.child_by_field_name("function")?;
            if function.kind() != "member_expression" {
                return None;
            }
            let property = node_text(function.child_by_field_name("property")?, text);
            let receiver = function.child_by_field_name("object")?;
            if property == "route" && self.rules.is_receiver(node_text(receiver, text)) {
                let arguments = object.child_by_field_name("arguments")?;
                let first = named_children(arguments).next()?;
                return url_from_node(first, text, constants);
            }
            if !self.rules.is_method(property) {
                return None;
            }
            object = receiver;
        }
    }

    fn from_text(&self, unit: &SourceUnit<'_>, context: Option<&str>, found: &mut Found) {
        let text = unit.text;
        for caps in self.patterns.member_call.captures_iter(text) {
            let (Some(whole), Some(method_match)) = (caps.get(0), caps.name("method")) else {
                continue;
            };
            if !self.rules.is_receiver(&caps["recv"]) || !self.rules.is_method(method_match.as_str())
            {
                continue;
            }
            let Ok(method) = method_match.as_str().parse::<HttpMethod>() else {
                continue;
            };
            let Some(url) = quoted_arg(&caps).filter(|u| looks_like_url(u)) else {
                continue;
            };
            let Some(open) = text[method_match.end()..].find('(') else {
                continue;
            };
            let args_start = method_match.end() + open + 1;
            found.add(self.text_endpoint(unit, method, &url, whole.start(), args_start, context));
        }

        for caps in self.patterns.direct_call.captures_iter(text) {
            let Some(callee) = caps.name("callee") else {
                continue;
            };
            if !self.rules.is_direct_call(callee.as_str()) {
                continue;
            }
            let preceded_by_member = text[..callee.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c == '.' || c.is_alphanumeric() || c == '_' || c == '$');
            if preceded_by_member {
                continue;
            }
            let Some(url) = quoted_arg(&caps).filter(|u| looks_like_url(u)) else {
                continue;
            };
            let Some(open) = text[callee.end()..].find('(') else {
                continue;
            };
            let args_start = callee.end() + open + 1;
            let (start, end) = paren_body(text, args_start);
            let method = self
                .patterns
                .method_option
                .captures(&text[start..end])
                .and_then(|m| m["m"].parse().ok())
                .unwrap_or_default();
            found.add(self.text_endpoint(unit, method, &url, callee.start(), args_start, context));
        }
    }

    fn text_endpoint(
        &self,
        unit: &SourceUnit<'_>,
        method: HttpMethod,
        url: &str,
        call_start: usize,
        args_start: usize,
        context: Option<&str>,
    ) -> ApiEndpoint {
        let text = unit.text;
        let mut endpoint = new_endpoint(method, url, unit, line_at(text, call_start), context);
        let (start, end) = paren_body(text, args_start);
        endpoint.requires_auth |= carries_credentials(&text[start..end]);

        let line_start = text[..call_start].rfind('\n').map_or(0, |i| i + 1);
        if let Some(caps) = self
            .patterns
            .awaited_destructure
            .captures(&text[line_start..call_start])
        {
            for name in destructured_names(&caps["fields"]) {
                endpoint.response_fields.insert(name);
            }
        }
        endpoint
    }
}

/// One recognized endpoint call.
struct CallSite<'t> {
    method: HttpMethod,
    url: String,
    arguments: Node<'t>,
    body: Option<Node<'t>>,
    options: Option<Node<'t>>,
    handlers: Vec<Node<'t>>,
}

/// Endpoints found in one file, merged by identity.
#[derive(Default)]
struct Found(BTreeMap<EndpointKey, ApiEndpoint>);

impl Found {
    fn add(&mut self, endpoint: ApiEndpoint) {
        match self.0.get_mut(&endpoint.key()) {
            Some(existing) => existing.merge(endpoint),
            None => {
                self.0.insert(endpoint.key(), endpoint);
            }
        }
    }

    fn into_vec(self) -> Vec<ApiEndpoint> {
        self.0.into_values().collect()
    }
}

fn new_endpoint(
    method: HttpMethod,
    url: &str,
    unit: &SourceUnit<'_>,
    line: u32,
    context: Option<&str>,
) -> ApiEndpoint {
    let (path, query) = split_query(url);
    let mut endpoint = ApiEndpoint::new(method, path);
    endpoint
        .locations
        .insert(SourceLocation::new(unit.path, line));
    for key in query {
        observe(&mut endpoint.params, key, ObservedType::String);
        endpoint.query_params.insert(key.to_owned());
    }
    endpoint.requires_auth = is_auth_url(url);
    if let Some(component) = context {
        endpoint.components.insert(component.to_owned());
    }
    endpoint
}

fn infer_request_model(endpoint: &mut ApiEndpoint) {
    if !endpoint.method.has_body() || endpoint.request_model.is_some() {
        return;
    }
    let has_body_params = endpoint
        .params
        .keys()
        .any(|name| !endpoint.query_params.contains(name));
    if has_body_params {
        endpoint.request_model = endpoint.resource.as_deref().map(resource_to_model_name);
    }
}

/// Returns the value node of `key` in an object literal.
fn object_value<'t>(object: Node<'t>, text: &str, key: &str) -> Option<Node<'t>> {
    named_children(object).find_map(|child| match child.kind() {
        "pair" => {
            let k = child.child_by_field_name("key")?;
            (unquote(node_text(k, text)) == key).then(|| child.child_by_field_name("value"))?
        }
        "shorthand_property_identifier" if node_text(child, text) == key => Some(child),
        _ => None,
    })
}

/// Calls `f` with each key of an object literal and its value node.
fn object_keys<'t>(object: Node<'t>, text: &str, mut f: impl FnMut(&str, Option<Node<'t>>)) {
    for child in named_children(object) {
        match child.kind() {
            "pair" => {
                if let Some(key) = child.child_by_field_name("key") {
                    f(unquote(node_text(key, text)), child.child_by_field_name("value"));
                }
            }
            "shorthand_property_identifier" => f(node_text(child, text), None),
            "method_definition" => {
                if let Some(name) = child.child_by_field_name("name") {
                    f(node_text(name, text), None);
                }
            }
            _ => {}
        }
    }
}

/// Records the fields of a literal request body.
fn body_params(body: Node<'_>, text: &str, endpoint: &mut ApiEndpoint) {
    let body = unwrap_stringify(body, text);
    if body.kind() != "object" {
        return;
    }
    object_keys(body, text, |name, value| {
        let tag = value.map_or(ObservedType::Unknown, |v| classify_value(node_text(v, text)));
        observe(&mut endpoint.params, name, tag);
    });
}

/// Records `params: { ... }` from a request options object as query parameters.
fn option_params(options: Node<'_>, text: &str, endpoint: &mut ApiEndpoint) {
    if options.kind() != "object" {
        return;
    }
    let Some(params) = object_value(options, text, "params").filter(|p| p.kind() == "object")
    else {
        return;
    };
    object_keys(params, text, |name, value| {
        let tag = value.map_or(ObservedType::Unknown, |v| classify_value(node_text(v, text)));
        observe(&mut endpoint.params, name, tag);
        endpoint.query_params.insert(name.to_owned());
    });
}

/// `JSON.stringify(x)` becomes `x`.
fn unwrap_stringify<'t>(node: Node<'t>, text: &str) -> Node<'t> {
    if node.kind() == "call_expression"
        && node
            .child_by_field_name("function")
            .is_some_and(|f| node_text(f, text) == "JSON.stringify")
    {
        if let Some(inner) = node
            .child_by_field_name("arguments")
            .and_then(|a| named_children(a).next())
        {
            return inner;
        }
    }
    node
}

/// Records what a route handler reads from the request and sends back.
fn handler_shape(handler: Node<'_>, text: &str, endpoint: &mut ApiEndpoint) {
    let params: Vec<Node<'_>> = match handler.child_by_field_name("parameters") {
        Some(list) => named_children(list).collect(),
        None => handler.child_by_field_name("parameter").into_iter().collect(),
    };
    let request = param_binding(&params, 0, text);
    let response = param_binding(&params, 1, text);
    let Some(body) = handler.child_by_field_name("body") else {
        return;
    };

    visit(body, |node| match node.kind() {
        "member_expression" => {
            let Some(request) = request else { return };
            let (Some(object), Some(property)) = (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) else {
                return;
            };
            if let Some(segment) = request_segment(node_text(object, text), request) {
                record_request_param(endpoint, segment, node_text(property, text));
            }
        }
        "variable_declarator" => {
            let Some(request) = request else { return };
            let (Some(name), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) else {
                return;
            };
            if name.kind() != "object_pattern" {
                return;
            }
            if let Some(segment) = request_segment(node_text(value, text), request) {
                for key in pattern_keys(name, text) {
                    record_request_param(endpoint, segment, &key);
                }
            }
        }
        "call_expression" => {
            let Some(response) = response else { return };
            let Some(function) = node
                .child_by_field_name("function")
                .filter(|f| f.kind() == "member_expression")
            else {
                return;
            };
            let sends = function
                .child_by_field_name("property")
                .is_some_and(|p| matches!(node_text(p, text), "json" | "send"));
            let on_response = function
                .child_by_field_name("object")
                .is_some_and(|o| node_text(o, text).starts_with(response));
            if !(sends && on_response) {
                return;
            }
            let payload = node
                .child_by_field_name("arguments")
                .and_then(|a| named_children(a).next())
                .filter(|p| p.kind() == "object");
            if let Some(payload) = payload {
                object_keys(payload, text, |name, _| {
                    endpoint.response_fields.insert(name.to_owned());
                });
            }
        }
        _ => {}
    });
}

/// Returns the identifier a handler parameter binds, if it is a plain name.
fn param_binding<'s>(params: &[Node<'_>], index: usize, text: &'s str) -> Option<&'s str> {
    let param = *params.get(index)?;
    let pattern = param.child_by_field_name("pattern").unwrap_or(param);
    (pattern.kind() == "identifier").then(|| node_text(pattern, text))
}

/// Returns `body`, `query` or `params` if `object` is `<request>.<segment>`.
fn request_segment<'a>(object: &'a str, request: &str) -> Option<&'a str> {
    let (head, segment) = object.split_once('.')?;
    (head == request && matches!(segment, "body" | "query" | "params")).then_some(segment)
}

fn record_request_param(endpoint: &mut ApiEndpoint, segment: &str, name: &str) {
    let tag = if segment == "body" {
        ObservedType::Unknown
    } else {
        ObservedType::String
    };
    observe(&mut endpoint.params, name, tag);
    if segment == "query" {
        endpoint.query_params.insert(name.to_owned());
    }
}

/// Collects the response fields read from an awaited call's result.
fn response_fields(call: Node<'_>, text: &str, fields: &mut BTreeSet<String>) {
    let Some((pattern, scope)) = bound_pattern(call) else {
        return;
    };
    match pattern.kind() {
        "object_pattern" => fields.extend(payload_keys(pattern, text)),
        "identifier" => {
            let binding = node_text(pattern, text);
            member_reads(scope, text, binding, fields);
            // One hop through `await res.json()`.
            visit(scope, |node| {
                if node.kind() != "variable_declarator" {
                    return;
                }
                let (Some(name), Some(value)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("value"),
                ) else {
                    return;
                };
                let value_text = node_text(value, text);
                let reads_json = value_text
                    .trim_start_matches("await")
                    .trim()
                    .starts_with(&format!("{binding}.json("));
                if !reads_json {
                    return;
                }
                match name.kind() {
                    "identifier" => member_reads(scope, text, node_text(name, text), fields),
                    "object_pattern" => fields.extend(payload_keys(name, text)),
                    _ => {}
                }
            });
        }
        _ => {}
    }
}

/// Returns the declarator pattern a call's awaited result is bound to, and
/// the enclosing function scope.
fn bound_pattern(call: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let mut child = call;
    let mut parent = call.parent()?;
    while matches!(
        parent.kind(),
        "await_expression" | "parenthesized_expression" | "as_expression" | "non_null_expression"
    ) {
        child = parent;
        parent = parent.parent()?;
    }
    if parent.kind() != "variable_declarator" || parent.child_by_field_name("value") != Some(child)
    {
        return None;
    }
    let pattern = parent.child_by_field_name("name")?;

    let mut scope = parent;
    while let Some(up) = scope.parent() {
        scope = up;
        if FUNCTION_KINDS.contains(&up.kind()) {
            break;
        }
    }
    Some((pattern, scope))
}

/// Collects `binding.x` and `binding.data.x` reads inside `scope`.
fn member_reads(scope: Node<'_>, text: &str, binding: &str, fields: &mut BTreeSet<String>) {
    let unwrapped = format!("{binding}.data");
    visit(scope, |node| {
        if node.kind() != "member_expression" {
            return;
        }
        let (Some(object), Some(property)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("property"),
        ) else {
            return;
        };
        let object = node_text(object, text);
        let property = node_text(property, text);
        if (object == binding || object == unwrapped) && !TRANSPORT_MEMBERS.contains(&property) {
            fields.insert(property.to_owned());
        }
    });
}

/// Keys of a destructuring pattern, descending into `data: { ... }`.
fn payload_keys(pattern: Node<'_>, text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for child in named_children(pattern) {
        if child.kind() == "pair_pattern" {
            let key = child
                .child_by_field_name("key")
                .map(|k| unquote(node_text(k, text)));
            let value = child.child_by_field_name("value");
            if let (Some("data"), Some(inner)) = (key, value) {
                if inner.kind() == "object_pattern" {
                    keys.extend(pattern_keys(inner, text));
                    continue;
                }
            }
        }
        if let Some(key) = pattern_key(child, text) {
            if key != "data" {
                keys.push(key);
            }
        }
    }
    keys
}

/// Keys of one level of a destructuring pattern.
pub(super) fn pattern_keys(pattern: Node<'_>, text: &str) -> Vec<String> {
    named_children(pattern)
        .filter_map(|child| pattern_key(child, text))
        .collect()
}

fn pattern_key(child: Node<'_>, text: &str) -> Option<String> {
    let key = match child.kind() {
        "shorthand_property_identifier_pattern" => node_text(child, text),
        "pair_pattern" => unquote(node_text(child.child_by_field_name("key")?, text)),
        "object_assignment_pattern" => node_text(child.child_by_field_name("left")?, text),
        _ => return None,
    };
    Some(key.to_owned())
}

/// Names bound by the text of an object destructuring pattern, descending
/// into `data: { ... }`.
fn destructured_names(fields: &str) -> Vec<String> {
    if let Some(rest) = fields.trim_start().strip_prefix("data") {
        if let Some(open) = rest.find('{') {
            if rest[..open].trim() == ":" {
                let inner = &rest[open + 1..];
                let close = inner.find('}').unwrap_or(inner.len());
                return destructured_names(&inner[..close]);
            }
        }
    }
    fields
        .split(',')
        .filter_map(|part| {
            let key = part.split([':', '=']).next()?.trim();
            let valid = !key.is_empty()
                && !key.starts_with("...")
                && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
            (valid && key != "data").then(|| key.to_owned())
        })
        .collect()
}
