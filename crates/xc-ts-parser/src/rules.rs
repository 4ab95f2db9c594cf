//! Extraction rule presets.
//!
//! The same extractors read both sides of a comparison. What differs is which
//! call shapes count as an endpoint: a UI calls `axios.get('/users')`, a
//! server declares `router.get('/users', handler)`. [`ExtractionRules`]
//! carries that difference and is injected when an extractor is built.

use serde::{Deserialize, Serialize};

/// URL fragments that mark an endpoint as requiring authentication.
pub const AUTH_KEYWORDS: &[&str] = &[
    "auth", "login", "logout", "token", "signin", "signup", "register", "session", "password",
    "oauth",
];

/// Call-argument markers that mark an endpoint as requiring authentication.
pub const CREDENTIAL_MARKERS: &[&str] = &["Authorization", "withCredentials"];

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

/// Which calls the endpoint extractor treats as endpoints.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::ExtractionRules;
///
/// let usage = ExtractionRules::usage();
/// assert!(usage.is_receiver("axios"));
/// assert!(usage.is_receiver("this.http"));
/// assert!(usage.is_direct_call("fetch"));
///
/// let declaration = ExtractionRules::declaration();
/// assert!(declaration.is_receiver("router"));
/// assert!(!declaration.is_direct_call("fetch"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Preset name; part of the cache key.
    pub name: String,

    /// Objects whose method calls (`<receiver>.<method>(url, ...)`) are endpoints.
    pub receivers: Vec<String>,

    /// Functions whose direct calls (`fetch(url, { method })`) are endpoints.
    pub direct_calls: Vec<String>,

    /// Lower-case method names recognized on receivers.
    pub methods: Vec<String>,
}

impl ExtractionRules {
    /// Rules for a UI codebase: outbound client transports.
    #[must_use]
    pub fn usage() -> Self {
        Self {
            name: "usage".to_owned(),
            receivers: to_owned(&[
                "axios", "api", "http", "client", "request", "$http", "this.http",
            ]),
            direct_calls: to_owned(&["fetch", "axios", "request"]),
            methods: to_owned(HTTP_METHODS),
        }
    }

    /// Rules for a server codebase: route declarations.
    #[must_use]
    pub fn declaration() -> Self {
        Self {
            name: "declaration".to_owned(),
            receivers: to_owned(&["app", "router", "server", "api", "route", "routes"]),
            direct_calls: Vec::new(),
            methods: to_owned(HTTP_METHODS),
        }
    }

    /// Returns `true` if `object` (the text left of `.method(`) is a known
    /// receiver, either exactly or as the last segment of a member chain.
    #[must_use]
    pub fn is_receiver(&self, object: &str) -> bool {
        let object = object.trim();
        let last = object.rsplit('.').next().unwrap_or(object);
        self.receivers.iter().any(|r| r == object || r == last)
    }

    /// Returns `true` if `callee` is a known direct transport.
    #[must_use]
    pub fn is_direct_call(&self, callee: &str) -> bool {
        self.direct_calls.iter().any(|c| c == callee)
    }

    /// Returns `true` if `name` is a recognized HTTP method name.
    #[must_use]
    pub fn is_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(name))
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Returns `true` if a URL contains an authentication keyword.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::rules::is_auth_url;
///
/// assert!(is_auth_url("/api/auth/refresh"));
/// assert!(is_auth_url("/api/users/Login"));
/// assert!(!is_auth_url("/api/users"));
/// ```
#[must_use]
pub fn is_auth_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    AUTH_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Returns `true` if call-argument text carries credentials.
#[must_use]
pub fn carries_credentials(argument_text: &str) -> bool {
    CREDENTIAL_MARKERS.iter().any(|m| argument_text.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_chain_receiver() {
        let rules = ExtractionRules::usage();
        assert!(rules.is_receiver("this.api"));
        assert!(rules.is_receiver("services.client"));
        assert!(!rules.is_receiver("console"));
    }

    #[test]
    fn test_methods_case_insensitive() {
        let rules = ExtractionRules::declaration();
        assert!(rules.is_method("GET"));
        assert!(rules.is_method("delete"));
        assert!(!rules.is_method("use"));
    }

    #[test]
    fn test_carries_credentials() {
        assert!(carries_credentials("{ headers: { Authorization: `Bearer ${t}` } }"));
        assert!(carries_credentials("{ withCredentials: true }"));
        assert!(!carries_credentials("{ params: { q } }"));
    }

    #[test]
    fn test_presets_differ_in_name() {
        assert_ne!(ExtractionRules::usage().name, ExtractionRules::declaration().name);
    }
}
