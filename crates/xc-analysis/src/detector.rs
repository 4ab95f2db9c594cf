//! Heuristic issue and pattern detection over one inventory.
//!
//! Every heuristic runs on its own and none short-circuits another:
//!
//! | Heuristic                  | Output                                  |
//! |----------------------------|-----------------------------------------|
//! | too many props             | `too_many_props` anti-pattern           |
//! | complexity above threshold | `high_complexity` anti-pattern          |
//! | mixed REST shapes          | `inconsistent_api_design` anti-pattern  |
//! | identical field sets       | `duplicate_models` anti-pattern         |
//! | credentials in query       | `credentials_in_query` security pattern |
//! | mixed URL segment naming   | `mixed_url_naming` issue                |
//! | endpoint field not in model| `field_mismatch` issue (high)           |
//! | mixed field naming         | `mixed_field_naming` issue              |

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;
use xc_core::{
    ApiEndpoint, CodePattern, DataModel, DetectorConfig, NamingIssue, PatternCategory,
    PatternRegistry, Severity, SourceLocation, is_param_segment,
};
use xc_scanner::Inventory;
use xc_ts_parser::naming::{
    NamingConvention, detect_convention, resource_to_model_name, to_camel_case, to_snake_case,
};

use crate::url::{canonicalize_url, segments, url_shape};

/// Final URL segments that still count as RESTful: the HTTP verbs
/// themselves.
pub const REST_VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

/// Query keys that must not carry credentials.
pub const CREDENTIAL_QUERY_KEYS: &[&str] = &["token", "password", "secret", "api_key", "apikey"];

/// Issues and patterns found in one or more inventories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Findings {
    /// Naming and shape issues, in detection order.
    pub naming_issues: Vec<NamingIssue>,
    /// Code patterns keyed by name.
    pub patterns: PatternRegistry,
}

impl Findings {
    /// Appends another set of findings, accumulating patterns by name.
    pub fn merge(&mut self, other: Self) {
        self.naming_issues.extend(other.naming_issues);
        for pattern in other.patterns.iter() {
            self.patterns.record(pattern.clone());
        }
    }

    fn issue(
        &mut self,
        kind: &str,
        description: String,
        location: Option<SourceLocation>,
        severity: Severity,
        suggestion: Option<String>,
    ) {
        self.naming_issues.push(NamingIssue {
            kind: kind.to_owned(),
            description,
            location,
            severity,
            suggestion,
        });
    }
}

/// Runs every heuristic with the thresholds from a [`DetectorConfig`].
///
/// # Examples
///
/// ```
/// use xc_analysis::PatternDetector;
/// use xc_core::{ApiEndpoint, DetectorConfig, HttpMethod};
/// use xc_scanner::Inventory;
///
/// let mut inventory = Inventory::new();
/// inventory.add_endpoint(ApiEndpoint::new(HttpMethod::Get, "/api/user_profiles/recentItems"));
///
/// let findings = PatternDetector::new(DetectorConfig::default()).detect(&inventory);
/// assert_eq!(findings.naming_issues[0].kind, "mixed_url_naming");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    /// Creates a detector.
    #[must_use]
    pub const fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Runs every heuristic over `inventory`.
    #[must_use]
    pub fn detect(&self, inventory: &Inventory) -> Findings {
        let mut findings = Findings::default();
        self.component_size(inventory, &mut findings);
        self.inconsistent_api_design(inventory, &mut findings);
        self.duplicate_models(inventory, &mut findings);
        credentials_in_query(inventory, &mut findings);
        mixed_url_naming(inventory, &mut findings);
        field_mismatch(inventory, &mut findings);
        mixed_field_naming(inventory, &mut findings);

        debug!(
            issues = findings.naming_issues.len(),
            patterns = findings.patterns.len(),
            "Detection completed"
        );
        findings
    }

    fn component_size(&self, inventory: &Inventory, findings: &mut Findings) {
        for component in inventory.components() {
            let location = SourceLocation::new(component.file.clone(), 1);
            if component.props.len() > self.config.max_props {
                findings.patterns.record(
                    CodePattern::new(
                        "too_many_props",
                        PatternCategory::AntiPattern,
                        format!(
                            "Component {} takes {} props (limit {})",
                            component.name,
                            component.props.len(),
                            self.config.max_props
                        ),
                        Severity::Medium,
                        1,
                    )
                    .at([location.clone()]),
                );
            }
            if component.complexity > self.config.max_complexity {
                findings.patterns.record(
                    CodePattern::new(
                        "high_complexity",
                        PatternCategory::AntiPattern,
                        format!(
                            "Component {} scores {} complexity (limit {})",
                            component.name, component.complexity, self.config.max_complexity
                        ),
                        Severity::Medium,
                        1,
                    )
                    .at([location]),
                );
            }
        }
    }

    fn inconsistent_api_design(&self, inventory: &Inventory, findings: &mut Findings) {
        let mut groups: BTreeMap<String, Vec<(&ApiEndpoint, bool)>> = BTreeMap::new();
        for endpoint in inventory.endpoints() {
            let canonical = canonicalize_url(&endpoint.url);
            let restful = is_restful(&canonical);
            groups
                .entry(url_shape(&canonical))
                .or_default()
                .push((endpoint, restful));
        }

        for (shape, members) in groups {
            if members.len() <= self.config.min_group_size {
                continue;
            }
            let restful = members.iter().filter(|(_, r)| *r).count();
            if restful == 0 || restful == members.len() {
                continue;
            }
            let occurrences = u32::try_from(members.len()).unwrap_or(u32::MAX);
            findings.patterns.record(
                CodePattern::new(
                    "inconsistent_api_design",
                    PatternCategory::AntiPattern,
                    format!(
                        "Routes under /{shape} mix identifier and action segments \
                         ({restful} of {} RESTful)",
                        members.len()
                    ),
                    Severity::Medium,
                    occurrences,
                )
                .at(members
                    .iter()
                    .flat_map(|(e, _)| e.locations.iter().cloned())),
            );
        }
    }

    fn duplicate_models(&self, inventory: &Inventory, findings: &mut Findings) {
        let mut by_fields: BTreeMap<BTreeSet<&str>, Vec<&DataModel>> = BTreeMap::new();
        for model in inventory.models() {
            let fields: BTreeSet<&str> = model.field_names().collect();
            if fields.len() > self.config.duplicate_min_fields {
                by_fields.entry(fields).or_default().push(model);
            }
        }

        for (fields, models) in by_fields {
            if models.len() < 2 {
                continue;
            }
            let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            let occurrences = u32::try_from(models.len()).unwrap_or(u32::MAX);
            findings.patterns.record(
                CodePattern::new(
                    "duplicate_models",
                    PatternCategory::AntiPattern,
                    format!(
                        "Models {} share the same {} fields",
                        names.join(", "),
                        fields.len()
                    ),
                    Severity::Medium,
                    occurrences,
                )
                .at(models.iter().flat_map(|m| m.locations.iter().cloned())),
            );
        }
    }
}

/// A route is RESTful when it ends in an identifier or an HTTP verb.
fn is_restful(canonical: &str) -> bool {
    segments(canonical).last().is_some_and(|last| {
        is_param_segment(last) || REST_VERBS.contains(&last.to_ascii_lowercase().as_str())
    })
}

fn credentials_in_query(inventory: &Inventory, findings: &mut Findings) {
    for endpoint in inventory.endpoints() {
        let leaked: Vec<&str> = endpoint
            .query_params
            .iter()
            .filter(|key| CREDENTIAL_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str()))
            .map(String::as_str)
            .collect();
        if leaked.is_empty() {
            continue;
        }
        findings.patterns.record(
            CodePattern::new(
                "credentials_in_query",
                PatternCategory::Security,
                format!(
                    "{} sends {} in the query string",
                    endpoint.key(),
                    leaked.join(", ")
                ),
                Severity::High,
                1,
            )
            .at(endpoint.locations.iter().cloned()),
        );
    }
}

/// Example URLs listed per convention in a `mixed_url_naming` issue.
const URL_EXAMPLES: usize = 3;

/// Flags an inventory whose URL segments use more than one of snake, camel
/// and kebab case, counted over every endpoint together.
fn mixed_url_naming(inventory: &Inventory, findings: &mut Findings) {
    let mut examples: BTreeMap<&'static str, BTreeSet<&str>> = BTreeMap::new();
    let mut location = None;
    for endpoint in inventory.endpoints() {
        let conventions = url_conventions(&canonicalize_url(&endpoint.url));
        if conventions.is_empty() {
            continue;
        }
        if location.is_none() {
            location = endpoint.locations.first().cloned();
        }
        for convention in conventions {
            examples.entry(convention).or_default().insert(endpoint.url.as_str());
        }
    }
    if examples.len() < 2 {
        return;
    }

    let labels: Vec<&str> = examples.keys().copied().collect();
    let listed: Vec<String> = examples
        .iter()
        .map(|(convention, urls)| {
            let urls: Vec<&str> = urls.iter().take(URL_EXAMPLES).copied().collect();
            format!("{convention}: {}", urls.join(", "))
        })
        .collect();
    findings.issue(
        "mixed_url_naming",
        format!(
            "Endpoint URLs mix {} segments ({})",
            labels.join(" and "),
            listed.join("; ")
        ),
        location,
        Severity::Medium,
        Some("Use one convention, typically kebab-case, for every segment".to_owned()),
    );
}

/// Case conventions used by the literal segments of a canonical URL.
fn url_conventions(canonical: &str) -> BTreeSet<&'static str> {
    segments(canonical)
        .filter(|s| !is_param_segment(s))
        .filter_map(detect_convention)
        .filter(|c| {
            matches!(
                c,
                NamingConvention::SnakeCase
                    | NamingConvention::CamelCase
                    | NamingConvention::KebabCase
            )
        })
        .map(NamingConvention::label)
        .collect()
}

fn field_mismatch(inventory: &Inventory, findings: &mut Findings) {
    for endpoint in inventory.endpoints() {
        let Some(model) = implied_model(inventory, endpoint) else {
            continue;
        };

        let referenced = endpoint
            .params
            .keys()
            .filter(|field| !endpoint.query_params.contains(*field))
            .chain(endpoint.response_fields.iter());
        let mut reported: BTreeSet<&str> = BTreeSet::new();
        for field in referenced {
            if has_field(model, field) || !reported.insert(field.as_str()) {
                continue;
            }
            findings.issue(
                "field_mismatch",
                format!(
                    "{} uses field '{field}' which model {} does not declare",
                    endpoint.key(),
                    model.name
                ),
                endpoint.locations.first().cloned(),
                Severity::High,
                Some(format!("Add '{field}' to {} or rename it at the call site", model.name)),
            );
        }
    }
}

/// The model an endpoint's URL implies when one is declared, otherwise the
/// model its request body was recorded under.
fn implied_model<'a>(inventory: &'a Inventory, endpoint: &ApiEndpoint) -> Option<&'a DataModel> {
    let from_url = endpoint
        .resource
        .as_deref()
        .map(resource_to_model_name)
        .and_then(|name| inventory.model(&name));
    match from_url {
        Some(model) if model.is_declared() => Some(model),
        _ => endpoint
            .request_model
            .as_deref()
            .and_then(|name| inventory.model(name))
            .or(from_url),
    }
}

/// Whether `model` has `field` under any case spelling. Only declared
/// fields count once a declaration exists, so body-only fields stay visible
/// as mismatches.
fn has_field(model: &DataModel, field: &str) -> bool {
    let known = |name: &str| {
        if model.is_declared() {
            model.declared.contains(name)
        } else {
            model.fields.contains_key(name)
        }
    };
    known(field) || known(&to_snake_case(field)) || known(&to_camel_case(field))
}

fn mixed_field_naming(inventory: &Inventory, findings: &mut Findings) {
    for model in inventory.models() {
        let conventions: BTreeSet<NamingConvention> = model
            .field_names()
            .filter_map(detect_convention)
            .collect();
        if !(conventions.contains(&NamingConvention::SnakeCase)
            && conventions.contains(&NamingConvention::CamelCase))
        {
            continue;
        }
        findings.issue(
            "mixed_field_naming",
            format!("Model {} mixes snake_case and camelCase fields", model.name),
            model.locations.first().cloned(),
            Severity::Medium,
            Some("Rename the fields to one convention or map them at the boundary".to_owned()),
        );
    }
}

#[cfg(test)]
mod tests {
    use xc_core::{Component, HttpMethod, ObservedType, observe};

    use super::*;

    fn endpoint(method: HttpMethod, url: &str, line: u32) -> ApiEndpoint {
        let mut endpoint = ApiEndpoint::new(method, url);
        endpoint.locations.insert(SourceLocation::new("src/api.ts", line));
        endpoint
    }

    fn model(name: &str, fields: &[&str]) -> DataModel {
        let mut model = DataModel::new(name);
        for field in fields {
            model.add_field(*field, ObservedType::String, true);
        }
        model.locations.insert(SourceLocation::new("src/models.ts", 1));
        model
    }

    fn detect(inventory: &Inventory) -> Findings {
        PatternDetector::default().detect(inventory)
    }

    fn issue_kinds(findings: &Findings) -> Vec<&str> {
        findings.naming_issues.iter().map(|i| i.kind.as_str()).collect()
    }

    #[test]
    fn test_inconsistent_api_design() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/items/:id", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Delete, "/items/:id", 2));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/items/search", 3));

        let findings = detect(&inventory);
        let pattern = findings.patterns.get("inconsistent_api_design").unwrap();
        assert_eq!(findings.patterns.len(), 1);
        assert_eq!(pattern.occurrences, 3);
        assert_eq!(pattern.locations.len(), 3);
        assert_eq!(pattern.category, PatternCategory::AntiPattern);
    }

    #[test]
    fn test_consistent_group_not_flagged() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/items/:id", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Put, "/items/:id", 2));
        inventory.add_endpoint(endpoint(HttpMethod::Post, "/items/post", 3));

        assert!(detect(&inventory).patterns.get("inconsistent_api_design").is_none());
    }

    #[test]
    fn test_small_group_not_judged() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/items/:id", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/items/search", 2));

        assert!(detect(&inventory).patterns.is_empty());
    }

    #[test]
    fn test_duplicate_models() {
        let fields = ["id", "name", "email", "phone"];
        let mut inventory = Inventory::new();
        inventory.add_model(model("Customer", &fields));
        inventory.add_model(model("Contact", &fields));
        inventory.add_model(model("Tag", &["id", "name"]));
        inventory.add_model(model("Label", &["id", "name"]));

        let findings = detect(&inventory);
        let pattern = findings.patterns.get("duplicate_models").unwrap();
        assert_eq!(pattern.occurrences, 2);
        assert!(pattern.description.contains("Contact, Customer"));
    }

    #[test]
    fn test_credentials_in_query() {
        let mut inventory = Inventory::new();
        for (i, key) in ["token", "password", "secret", "api_key", "apiKey"].iter().enumerate() {
            let mut e = endpoint(HttpMethod::Get, &format!("/api/r{i}"), 1);
            e.query_params.insert((*key).to_owned());
            inventory.add_endpoint(e);
        }
        let mut safe = endpoint(HttpMethod::Get, "/api/safe", 1);
        safe.query_params.insert("page".to_owned());
        inventory.add_endpoint(safe);

        let findings = detect(&inventory);
        let pattern = findings.patterns.get("credentials_in_query").unwrap();
        assert_eq!(pattern.occurrences, 5);
        assert_eq!(pattern.severity, Severity::High);
        assert_eq!(pattern.category, PatternCategory::Security);
    }

    #[test]
    fn test_mixed_url_naming() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/user_profiles/recent-items", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/user-profiles/{userId}", 2));

        let findings = detect(&inventory);
        assert_eq!(issue_kinds(&findings), ["mixed_url_naming"]);
        assert!(findings.naming_issues[0]
            .description
            .contains("kebab-case and snake_case"));
    }

    #[test]
    fn test_mixed_url_naming_across_endpoints() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/user_profiles", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/orderItems", 2));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/shipping-rates", 3));

        let findings = detect(&inventory);
        assert_eq!(issue_kinds(&findings), ["mixed_url_naming"]);
        let description = &findings.naming_issues[0].description;
        assert!(description.contains("camelCase and kebab-case and snake_case"));
        assert!(description.contains("camelCase: /api/orderItems"));
        assert!(description.contains("kebab-case: /api/shipping-rates"));
        assert!(description.contains("snake_case: /api/user_profiles"));
    }

    #[test]
    fn test_consistent_url_naming_not_flagged() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/user-profiles/{user_id}", 1));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/shipping-rates", 2));
        inventory.add_endpoint(endpoint(HttpMethod::Get, "/api/orders", 3));

        assert!(detect(&inventory).naming_issues.is_empty());
    }

    #[test]
    fn test_field_mismatch_is_high_severity() {
        let mut posts = endpoint(HttpMethod::Get, "/api/posts/", 7);
        posts.response_fields.insert("title".to_owned());
        posts.response_fields.insert("authorName".to_owned());
        posts.response_fields.insert("createdAt".to_owned());
        observe(&mut posts.params, "page", ObservedType::String);
        posts.query_params.insert("page".to_owned());

        let mut inventory = Inventory::new();
        inventory.add_endpoint(posts);
        inventory.add_model(model("Post", &["id", "title", "created_at"]));

        let findings = detect(&inventory);
        let mismatches: Vec<&NamingIssue> = findings
            .naming_issues
            .iter()
            .filter(|i| i.kind == "field_mismatch")
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].description.contains("'authorName'"));
        assert_eq!(mismatches[0].severity, Severity::High);
        assert_eq!(mismatches[0].location.as_ref().map(|l| l.line), Some(7));
    }

    #[test]
    fn test_field_mismatch_against_declared_model() {
        let mut order = DataModel::new("Order");
        order.add_field("id", ObservedType::Number, true);
        order.add_field("total", ObservedType::Number, true);
        order.declared.extend(["id".to_owned(), "total".to_owned()]);
        // Model recorded from the request body of the same call.
        let mut body = DataModel::new("Order");
        body.add_field("note", ObservedType::String, false);

        let mut create = endpoint(HttpMethod::Post, "/api/orders", 4);
        observe(&mut create.params, "note", ObservedType::String);
        create.request_model = Some("Order".to_owned());

        let mut inventory = Inventory::new();
        inventory.add_model(order);
        inventory.add_model(body);
        inventory.add_endpoint(create);

        let findings = detect(&inventory);
        let mismatches: Vec<&str> = findings
            .naming_issues
            .iter()
            .filter(|i| i.kind == "field_mismatch")
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].contains("'note'"));
        assert!(mismatches[0].contains("model Order"));
    }

    #[test]
    fn test_body_only_model_matches_its_own_fields() {
        let mut body = DataModel::new("Order");
        body.add_field("note", ObservedType::String, false);
        let mut create = endpoint(HttpMethod::Post, "/api/orders", 4);
        observe(&mut create.params, "note", ObservedType::String);
        create.request_model = Some("Order".to_owned());

        let mut inventory = Inventory::new();
        inventory.add_model(body);
        inventory.add_endpoint(create);

        assert!(detect(&inventory).naming_issues.is_empty());
    }

    #[test]
    fn test_field_mismatch_needs_implied_model() {
        let mut e = endpoint(HttpMethod::Get, "/api/reports/", 1);
        e.response_fields.insert("total".to_owned());
        let mut inventory = Inventory::new();
        inventory.add_endpoint(e);

        assert!(detect(&inventory).naming_issues.is_empty());
    }

    #[test]
    fn test_mixed_field_naming() {
        let mut inventory = Inventory::new();
        inventory.add_model(model("Order", &["order_id", "createdAt", "total"]));
        inventory.add_model(model("Line", &["line_id", "unit_price"]));

        let findings = detect(&inventory);
        assert_eq!(issue_kinds(&findings), ["mixed_field_naming"]);
        assert!(findings.naming_issues[0].description.contains("Order"));
    }

    #[test]
    fn test_component_thresholds() {
        let mut big = Component::new("Dashboard", "src/Dashboard.tsx");
        for i in 0..11 {
            observe(&mut big.props, format!("prop{i}"), ObservedType::Unknown);
        }
        big.complexity = 51;
        let mut small = Component::new("Badge", "src/Badge.tsx");
        small.complexity = 50;

        let mut inventory = Inventory::new();
        inventory.add_component(big);
        inventory.add_component(small);

        let findings = detect(&inventory);
        assert_eq!(findings.patterns.get("too_many_props").unwrap().occurrences, 1);
        assert_eq!(findings.patterns.get("high_complexity").unwrap().occurrences, 1);
    }

    #[test]
    fn test_heuristics_do_not_short_circuit() {
        let mut leaky = endpoint(HttpMethod::Get, "/api/user_profiles/recentItems", 1);
        leaky.query_params.insert("token".to_owned());
        let mut inventory = Inventory::new();
        inventory.add_endpoint(leaky);

        let findings = detect(&inventory);
        assert!(findings.patterns.get("credentials_in_query").is_some());
        assert_eq!(issue_kinds(&findings), ["mixed_url_naming"]);
    }

    #[test]
    fn test_findings_merge_accumulates() {
        let mut inventory = Inventory::new();
        let mut e = endpoint(HttpMethod::Get, "/login", 1);
        e.query_params.insert("password".to_owned());
        inventory.add_endpoint(e);

        let mut findings = detect(&inventory);
        findings.merge(detect(&inventory));
        assert_eq!(findings.patterns.get("credentials_in_query").unwrap().occurrences, 2);
    }
}
