//! API endpoint types.
//!
//! An [`ApiEndpoint`] is identified by its [`EndpointKey`], the pair of HTTP
//! method and URL template. Extractions of the same key from different files
//! are folded together with [`ApiEndpoint::merge`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use super::location::SourceLocation;
use super::observed::{FieldTypes, widen};

/// An HTTP method.
///
/// # Examples
///
/// ```
/// use xc_core::HttpMethod;
///
/// let method: HttpMethod = "post".parse().unwrap();
/// assert_eq!(method, HttpMethod::Post);
/// assert_eq!(method.as_str(), "POST");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// All methods, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    /// Returns the upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Returns `true` for methods that conventionally carry a request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method '{0}'")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

/// The identity of an endpoint: method plus URL template.
///
/// Displays as `"METHOD url"`, the form used for compatibility keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointKey {
    /// HTTP method.
    pub method: HttpMethod,
    /// URL template as extracted.
    pub url: String,
}

impl EndpointKey {
    /// Creates a new endpoint key.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An API endpoint observed in source text.
///
/// # Examples
///
/// ```
/// use xc_core::{ApiEndpoint, HttpMethod, SourceLocation};
///
/// let mut a = ApiEndpoint::new(HttpMethod::Get, "/items/");
/// a.locations.insert(SourceLocation::new("a.ts", 1));
/// let mut b = ApiEndpoint::new(HttpMethod::Get, "/items/");
/// b.locations.insert(SourceLocation::new("b.ts", 9));
///
/// a.merge(b);
/// assert_eq!(a.locations.len(), 2);
/// assert_eq!(a.resource.as_deref(), Some("items"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// HTTP method.
    pub method: HttpMethod,

    /// URL template, with placeholders in whatever notation the source used.
    pub url: String,

    /// Every place this endpoint was observed.
    pub locations: BTreeSet<SourceLocation>,

    /// Request parameter name to observed type hints.
    pub params: FieldTypes,

    /// Parameter names that travel in the query string.
    pub query_params: BTreeSet<String>,

    /// Field names read from the response.
    pub response_fields: BTreeSet<String>,

    /// Names of components that call this endpoint.
    pub components: BTreeSet<String>,

    /// Whether the URL or call shape suggests authentication.
    pub requires_auth: bool,

    /// Last non-parameter URL segment.
    pub resource: Option<String>,

    /// Model name inferred from a request body, if any.
    pub request_model: Option<String>,
}

impl ApiEndpoint {
    /// Creates an endpoint with no observations yet.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        let url = url.into();
        let resource = resource_segment(&url).map(str::to_owned);
        Self {
            method,
            url,
            locations: BTreeSet::new(),
            params: FieldTypes::new(),
            query_params: BTreeSet::new(),
            response_fields: BTreeSet::new(),
            components: BTreeSet::new(),
            requires_auth: false,
            resource,
            request_model: None,
        }
    }

    /// Returns this endpoint's identity.
    #[must_use]
    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(self.method, self.url.clone())
    }

    /// Folds another extraction of the same endpoint into this one.
    ///
    /// Every collection is unioned; flags only ever turn on.
    pub fn merge(&mut self, other: Self) {
        debug_assert_eq!(self.method, other.method);
        self.locations.extend(other.locations);
        widen(&mut self.params, other.params);
        self.query_params.extend(other.query_params);
        self.response_fields.extend(other.response_fields);
        self.components.extend(other.components);
        self.requires_auth |= other.requires_auth;
        if self.resource.is_none() {
            self.resource = other.resource;
        }
        if self.request_model.is_none() {
            self.request_model = other.request_model;
        }
    }

    /// Points every location at `file`.
    pub fn relocate(&mut self, file: &Utf8Path) {
        self.locations = self.locations.iter().map(|l| l.with_file(file)).collect();
    }
}

/// Returns `true` if a URL segment is a placeholder in any supported notation
/// (`{id}`, `:id`, `${id}`, `<id>`, `<int:id>`) or a literal numeric id.
#[must_use]
pub fn is_param_segment(segment: &str) -> bool {
    (segment.starts_with('{') && segment.ends_with('}'))
        || (segment.starts_with("${") && segment.ends_with('}'))
        || (segment.starts_with('<') && segment.ends_with('>'))
        || (segment.starts_with(':') && segment.len() > 1)
        || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}

/// Returns the last non-parameter path segment of a URL, ignoring any query
/// string or fragment.
///
/// # Examples
///
/// ```
/// use xc_core::resource_segment;
///
/// assert_eq!(resource_segment("/api/users/:id/"), Some("users"));
/// assert_eq!(resource_segment("/api/posts?page=2"), Some("posts"));
/// assert_eq!(resource_segment("/{id}"), None);
/// ```
#[must_use]
pub fn resource_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .rev()
        .find(|s| !is_param_segment(s))
}
