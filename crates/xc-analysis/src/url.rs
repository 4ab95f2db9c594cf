//! URL canonicalization.
//!
//! Two codebases rarely spell the same route the same way: one writes
//! `` `${BASE}/users/${id}` ``, the other `/users/:id/`. The canonical form
//! drops everything but the path and gives every placeholder one notation:
//!
//! | Input                              | Canonical          |
//! |------------------------------------|--------------------|
//! | `https://api.test/users/:id?x=1`   | `users/{id}/`      |
//! | `/users/<int:id>`                  | `users/{id}/`      |
//! | `` /users/${userId}/posts ``       | `users/{userId}/posts/` |
//! | `/`                                | `/`                |
//!
//! Canonicalization is idempotent. [`url_pattern`] turns a canonical URL
//! into an anchored regex in which each placeholder matches one segment.

use std::collections::BTreeSet;

use regex::Regex;
use xc_core::is_param_segment;

use crate::error::AnalysisError;

/// Reduces a URL to its canonical path form.
///
/// # Examples
///
/// ```
/// use xc_analysis::canonicalize_url;
///
/// assert_eq!(canonicalize_url("/items/:id"), "items/{id}/");
/// assert_eq!(canonicalize_url("items/{id}/"), "items/{id}/");
/// assert_eq!(canonicalize_url("http://localhost:8000/api/<int:pk>/#top"), "api/{pk}/");
/// ```
#[must_use]
pub fn canonicalize_url(url: &str) -> String {
    let path = strip_origin(url);
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let mut rewritten = String::with_capacity(path.len());
    rewrite_placeholders(path, &mut rewritten);

    let mut canonical = rewritten
        .split('/')
        .filter(|segment| !segment.trim().is_empty())
        .collect::<Vec<_>>()
        .join("/");
    canonical.push('/');
    canonical
}

/// Builds an anchored regex from a canonical URL in which every `{name}`
/// placeholder matches exactly one non-empty segment.
///
/// # Errors
///
/// Returns [`AnalysisError::Pattern`] if the resulting expression is rejected
/// by the regex engine.
pub fn url_pattern(canonical: &str) -> Result<Regex, AnalysisError> {
    let mut expr = String::with_capacity(canonical.len() + 8);
    expr.push('^');
    let mut rest = canonical;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        expr.push_str(&regex::escape(&rest[..open]));
        expr.push_str("[^/]+");
        rest = &rest[open + len + 1..];
    }
    expr.push_str(&regex::escape(rest));
    expr.push('$');

    Regex::new(&expr).map_err(|source| AnalysisError::Pattern {
        url: canonical.to_owned(),
        source,
    })
}

/// Returns the shape of a canonical URL used to group sibling routes:
/// parameter segments and the last segment become `*`.
///
/// # Examples
///
/// ```
/// use xc_analysis::url::url_shape;
///
/// assert_eq!(url_shape("items/{id}/"), "items/*");
/// assert_eq!(url_shape("items/search/"), "items/*");
/// assert_eq!(url_shape("shops/{id}/items/"), "shops/*/*");
/// ```
#[must_use]
pub fn url_shape(canonical: &str) -> String {
    let segments: Vec<&str> = canonical.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == last || is_param_segment(segment) {
                "*"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the non-empty segments of a canonical URL.
pub fn segments(canonical: &str) -> impl Iterator<Item = &str> {
    canonical.split('/').filter(|s| !s.is_empty())
}

/// Returns the placeholder names of a canonical URL.
///
/// ```
/// use xc_analysis::url::{canonicalize_url, placeholder_names};
///
/// let canonical = canonicalize_url("/shops/:shopId/items/<int:id>");
/// assert_eq!(placeholder_names(&canonical).into_iter().collect::<Vec<_>>(), ["id", "shopId"]);
/// ```
#[must_use]
pub fn placeholder_names(canonical: &str) -> BTreeSet<&str> {
    segments(canonical)
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .collect()
}

fn strip_origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let scheme = &url[..scheme_end];
    let is_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
    if !is_scheme {
        return url;
    }
    let after = &url[scheme_end + 3..];
    after.find('/').map_or("", |slash| &after[slash..])
}

/// Rewrites `:name`, `{name}`, `${name}`, `<name>` and `<type:name>` to
/// `{name}`.
fn rewrite_placeholders(path: &str, out: &mut String) {
    let mut rest = path;
    while let Some(c) = rest.chars().next() {
        let consumed = match c {
            '$' if rest[1..].starts_with('{') => placeholder(&rest[2..], '}')
                .map(|(name, len)| (name, len + 2)),
            '{' => placeholder(&rest[1..], '}').map(|(name, len)| (name, len + 1)),
            '<' => placeholder(&rest[1..], '>').map(|(inner, len)| {
                let name = inner.rsplit(':').next().unwrap_or(inner);
                (name, len + 1)
            }),
            ':' => {
                let ident = identifier(&rest[1..]);
                (!ident.is_empty()).then(|| (ident, ident.len() + 1))
            }
            _ => None,
        };
        match consumed {
            Some((name, len)) => {
                while out.ends_with('$') {
                    out.pop();
                }
                out.push('{');
                out.push_str(name.trim());
                out.push('}');
                rest = &rest[len..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

/// Returns the text up to `close` and the length consumed including it.
fn placeholder(text: &str, close: char) -> Option<(&str, usize)> {
    text.find(close).map(|end| (&text[..end], end + 1))
}

fn identifier(text: &str) -> &str {
    let starts = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts {
        return "";
    }
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_placeholder_notations_agree() {
        for url in [
            "/api/users/:id",
            "/api/users/{id}",
            "/api/users/${id}",
            "/api/users/<id>",
            "/api/users/<int:id>",
            "api/users/{id}/",
        ] {
            assert_eq!(canonicalize_url(url), "api/users/{id}/", "{url}");
        }
    }

    #[test]
    fn test_strips_origin_query_and_fragment() {
        assert_eq!(
            canonicalize_url("https://example.com:8443/v1/orders?page=2#list"),
            "v1/orders/"
        );
        assert_eq!(canonicalize_url("https://example.com"), "/");
        assert_eq!(canonicalize_url(""), "/");
    }

    #[test]
    fn test_template_expression_placeholder() {
        assert_eq!(canonicalize_url("/users/${ user.id }/posts"), "users/{user.id}/posts/");
        assert_eq!(canonicalize_url("/files/$${name}"), "files/{name}/");
    }

    #[test]
    fn test_port_without_scheme_is_literal() {
        assert_eq!(canonicalize_url("localhost:3000/api"), "localhost:3000/api/");
    }

    #[test]
    fn test_collapses_empty_segments() {
        assert_eq!(canonicalize_url("//api///items//"), "api/items/");
    }

    #[test]
    fn test_url_pattern_matches_any_segment() {
        let pattern = url_pattern("api/users/{id}/").unwrap();
        assert!(pattern.is_match("api/users/{id}/"));
        assert!(pattern.is_match("api/users/42/"));
        assert!(!pattern.is_match("api/users/"));
        assert!(!pattern.is_match("api/users/42/posts/"));
    }

    #[test]
    fn test_url_pattern_escapes_literals() {
        let pattern = url_pattern("files/a.b/").unwrap();
        assert!(pattern.is_match("files/a.b/"));
        assert!(!pattern.is_match("files/axb/"));
    }

    #[test]
    fn test_url_shape() {
        assert_eq!(url_shape("items/"), "*");
        assert_eq!(url_shape("/"), "");
        assert_eq!(url_shape("api/items/{id}/"), "api/items/*");
        assert_eq!(url_shape("api/items/all/"), "api/items/*");
    }

    #[test]
    fn test_placeholder_names() {
        let names = placeholder_names("api/users/{userId}/posts/{id}/");
        assert_eq!(names, BTreeSet::from(["id", "userId"]));
        assert!(placeholder_names("api/users/42/").is_empty());
    }

    proptest! {
        #[test]
        fn test_canonicalize_is_idempotent(url in "[a-z0-9:/{}<>$?#._ -]{0,40}") {
            let once = canonicalize_url(&url);
            prop_assert_eq!(canonicalize_url(&once), once.clone());
            prop_assert!(once.ends_with('/'));
        }

        #[test]
        fn test_canonical_form_matches_own_pattern(url in "(/[a-z]{1,6}|/:[a-z]{1,4}|/\\{[a-z]{1,4}\\}){0,5}") {
            let canonical = canonicalize_url(&url);
            let pattern = url_pattern(&canonical).unwrap();
            prop_assert!(pattern.is_match(&canonical));
        }
    }
}
