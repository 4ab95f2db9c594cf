//! Fuzzy matching of a usage inventory (A) against a declaration
//! inventory (B).
//!
//! # Models
//!
//! Each A model is looked up in B under a handful of spellings (see
//! [`model_variants`]). The first hit is a match scored by the [`jaccard`]
//! similarity of the two field-name sets.
//!
//! # Endpoints
//!
//! B endpoints are grouped by canonical URL. An A endpoint matches a group
//! when either URL pattern matches the other's canonical form; among several
//! matching groups the best [`endpoint_quality`] wins, ties going to the
//! first group in URL order.
//!
//! ```text
//! quality = 0.4 × method term + 0.6 × parameter term
//!
//! method term     1.0 if B serves the same method at that URL, else 0.5
//! parameter term  Jaccard of URL placeholder names (1.0 when both sides have none)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::debug;
use xc_core::{ApiEndpoint, CompatibilityRecord, EndpointMatch, ModelMatch};
use xc_scanner::Inventory;
use xc_ts_parser::naming::{pluralize, to_camel_case, to_snake_case};

use crate::error::AnalysisError;
use crate::url::{canonicalize_url, placeholder_names, url_pattern};

/// Weight of the method term in [`endpoint_quality`].
pub const METHOD_WEIGHT: f64 = 0.4;
/// Weight of the parameter term in [`endpoint_quality`].
pub const PARAM_WEIGHT: f64 = 0.6;
/// Method term when B serves the URL under a different method.
pub const METHOD_MISMATCH: f64 = 0.5;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`, or `0.0` when either set is
/// empty.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use xc_analysis::jaccard;
///
/// let a: BTreeSet<_> = ["id", "name", "email"].into();
/// let b: BTreeSet<_> = ["id", "name", "email", "password"].into();
/// assert_eq!(jaccard(&a, &b), 0.75);
/// ```
#[must_use]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Spellings under which a model is looked up in the counterpart:
/// verbatim, snake_case, camelCase and pluralized snake_case, without
/// duplicates.
///
/// # Examples
///
/// ```
/// use xc_analysis::matching::model_variants;
///
/// assert_eq!(model_variants("OrderItem"), ["OrderItem", "order_item", "orderItem", "order_items"]);
/// assert_eq!(model_variants("user"), ["user", "users"]);
/// ```
#[must_use]
pub fn model_variants(name: &str) -> Vec<String> {
    let snake = to_snake_case(name);
    let candidates = [
        name.to_owned(),
        snake.clone(),
        to_camel_case(name),
        pluralize(&snake),
    ];
    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Scores an endpoint pair from the placeholder names of both URLs.
#[must_use]
pub fn endpoint_quality(
    method_supported: bool,
    params: &BTreeSet<&str>,
    counterpart_params: &BTreeSet<&str>,
) -> f64 {
    let method_term = if method_supported { 1.0 } else { METHOD_MISMATCH };
    let param_term = if params.is_empty() && counterpart_params.is_empty() {
        1.0
    } else {
        jaccard(params, counterpart_params)
    };
    METHOD_WEIGHT * method_term + PARAM_WEIGHT * param_term
}

/// Matches two inventories.
///
/// # Errors
///
/// Returns [`AnalysisError::Pattern`] if a URL cannot be compiled into a
/// matching pattern.
pub fn match_inventories(
    usage: &Inventory,
    declaration: &Inventory,
) -> Result<CompatibilityRecord, AnalysisError> {
    let mut record = CompatibilityRecord::default();
    match_models(usage, declaration, &mut record);
    match_endpoints(usage, declaration, &mut record)?;
    debug!(
        model_matches = record.model_matches.len(),
        endpoint_matches = record.endpoint_matches.len(),
        endpoints_only_in_a = record.endpoints_only_in_a.len(),
        endpoints_only_in_b = record.endpoints_only_in_b.len(),
        "Matched inventories"
    );
    Ok(record)
}

/// Matches every A model against B by name variants.
pub fn match_models(usage: &Inventory, declaration: &Inventory, record: &mut CompatibilityRecord) {
    let mut matched_in_b: BTreeSet<&str> = BTreeSet::new();

    for model in usage.models() {
        let hit = model_variants(&model.name)
            .into_iter()
            .find_map(|variant| declaration.model(&variant));
        match hit {
            Some(counterpart) => {
                let ours: BTreeSet<&str> = model.field_names().collect();
                let theirs: BTreeSet<&str> = counterpart.field_names().collect();
                record.model_matches.insert(
                    model.name.clone(),
                    ModelMatch {
                        matched: counterpart.name.clone(),
                        similarity: jaccard(&ours, &theirs),
                    },
                );
                matched_in_b.insert(counterpart.name.as_str());
            }
            None => {
                record.models_missing.insert(model.name.clone());
            }
        }
    }

    record.models_only_in_b.extend(
        declaration
            .models()
            .filter(|m| !matched_in_b.contains(m.name.as_str()))
            .map(|m| m.name.clone()),
    );
}

/// B endpoints sharing one canonical URL.
struct UrlGroup<'a> {
    canonical: String,
    pattern: Regex,
    endpoints: Vec<&'a ApiEndpoint>,
}

impl<'a> UrlGroup<'a> {
    /// The endpoint an A endpoint with `endpoint`'s method pairs with: the
    /// same method if served, else the first in method order.
    fn counterpart(&self, endpoint: &ApiEndpoint) -> Option<(&'a ApiEndpoint, bool)> {
        self.endpoints
            .iter()
            .find(|e| e.method == endpoint.method)
            .map(|e| (*e, true))
            .or_else(|| self.endpoints.first().map(|e| (*e, false)))
    }
}

/// Matches every A endpoint against B by URL pattern and records the
/// unmatched ones on both sides.
///
/// # Errors
///
/// Returns [`AnalysisError::Pattern`] if a URL cannot be compiled into a
/// matching pattern.
pub fn match_endpoints(
    usage: &Inventory,
    declaration: &Inventory,
    record: &mut CompatibilityRecord,
) -> Result<(), AnalysisError> {
    let groups = group_by_url(declaration)?;
    let mut patterns: BTreeMap<String, Regex> = BTreeMap::new();
    let mut matched_in_b: BTreeSet<String> = BTreeSet::new();

    for endpoint in usage.endpoints() {
        let canonical = canonicalize_url(&endpoint.url);
        if !patterns.contains_key(&canonical) {
            patterns.insert(canonical.clone(), url_pattern(&canonical)?);
        }
        let Some(pattern) = patterns.get(&canonical) else {
            continue;
        };

        let params = placeholder_names(&canonical);
        let mut best: Option<(&ApiEndpoint, f64)> = None;
        for group in groups.values() {
            if !pattern.is_match(&group.canonical) && !group.pattern.is_match(&canonical) {
                continue;
            }
            let Some((counterpart, same_method)) = group.counterpart(endpoint) else {
                continue;
            };
            let quality =
                endpoint_quality(same_method, &params, &placeholder_names(&group.canonical));
            if best.is_none_or(|(_, q)| quality > q) {
                best = Some((counterpart, quality));
            }
        }

        let key = endpoint.key().to_string();
        match best {
            Some((counterpart, similarity)) => {
                matched_in_b.insert(counterpart.key().to_string());
                record.endpoint_matches.insert(
                    key,
                    EndpointMatch {
                        matched_url: counterpart.url.clone(),
                        similarity,
                    },
                );
            }
            None => {
                record.endpoints_only_in_a.insert(key);
            }
        }
    }

    record.endpoints_only_in_b.extend(
        declaration
            .endpoints()
            .map(|e| e.key().to_string())
            .filter(|key| !matched_in_b.contains(key)),
    );
    Ok(())
}

fn group_by_url(inventory: &Inventory) -> Result<BTreeMap<String, UrlGroup<'_>>, AnalysisError> {
    let mut groups: BTreeMap<String, UrlGroup<'_>> = BTreeMap::new();
    for endpoint in inventory.endpoints() {
        let canonical = canonicalize_url(&endpoint.url);
        if let Some(group) = groups.get_mut(&canonical) {
            group.endpoints.push(endpoint);
            continue;
        }
        let pattern = url_pattern(&canonical)?;
        groups.insert(
            canonical.clone(),
            UrlGroup {
                canonical,
                pattern,
                endpoints: vec![endpoint],
            },
        );
    }
    Ok(groups)
}
