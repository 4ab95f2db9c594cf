//! Entity extraction from one source file.
//!
//! Each extractor reads a [`SourceUnit`]: the file's path and text, plus the
//! syntax tree when the structured parse succeeded. With a tree, extractors
//! walk nodes; without one they fall back to the compiled text patterns.
//! Either way they return plain entities, never an error.
//!
//! [`FileExtractor`] owns one parser and one of each extractor and is what a
//! scan worker drives, one file at a time.

mod complexity;
mod component;
mod endpoint;
mod model;

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use xc_core::{AnalyzerConfig, ApiEndpoint, Component, DataModel};

pub use complexity::{ComplexityBreakdown, complexity_score};
pub use component::{ComponentExtractor, file_component_name};
pub use endpoint::EndpointExtractor;
pub use model::ModelExtractor;

use crate::error::{ParseError, ParseFailure};
use crate::parser::{ParseCounters, ParseTree, SourceKind, TolerantParser};
use crate::rules::ExtractionRules;

/// One file as seen by the extractors.
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'a> {
    /// Path recorded in every location.
    pub path: &'a Utf8Path,
    /// Full file text.
    pub text: &'a str,
    /// Syntax tree, if the structured parse succeeded.
    pub tree: Option<&'a ParseTree>,
}

/// Turns a source file into entities of one kind.
pub trait Extractor {
    /// The entity produced.
    type Entity;

    /// Extracts every entity in `unit`.
    ///
    /// `context` carries caller-supplied context, such as the name of the
    /// component defined in the same file.
    fn extract(&self, unit: &SourceUnit<'_>, context: Option<&str>) -> Vec<Self::Entity>;
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtraction {
    /// Endpoints, merged by identity within the file.
    pub endpoints: Vec<ApiEndpoint>,
    /// Declared and request-body models, merged by name within the file.
    pub models: Vec<DataModel>,
    /// At most one component.
    pub components: Vec<Component>,
    /// Why the structured parse was skipped, if it was.
    #[serde(skip)]
    pub parse_failure: Option<ParseFailure>,
}

impl FileExtraction {
    /// Returns `true` if nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.models.is_empty() && self.components.is_empty()
    }

    /// Points every location and component file at `path`.
    ///
    /// Cached extractions are keyed by content, so a hit may come from a
    /// different file with identical text.
    pub fn relocate(&mut self, path: &Utf8Path) {
        for endpoint in &mut self.endpoints {
            endpoint.relocate(path);
        }
        for model in &mut self.models {
            model.relocate(path);
        }
        for component in &mut self.components {
            component.relocate(path);
        }
    }
}

/// Drives parsing and every extractor for one worker.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use xc_core::AnalyzerConfig;
/// use xc_ts_parser::{ExtractionRules, FileExtractor};
///
/// let mut extractor = FileExtractor::new(ExtractionRules::usage(), &AnalyzerConfig::default())?;
/// let extraction = extractor.extract(
///     Utf8Path::new("src/api.ts"),
///     "export const load = () => axios.get('/api/users');",
/// );
/// assert_eq!(extraction.endpoints.len(), 1);
/// assert_eq!(extraction.endpoints[0].url, "/api/users");
/// # Ok::<(), xc_ts_parser::ParseError>(())
/// ```
#[derive(Debug)]
pub struct FileExtractor {
    parser: TolerantParser,
    endpoints: EndpointExtractor,
    models: ModelExtractor,
    components: ComponentExtractor,
}

impl FileExtractor {
    /// Creates an extractor applying `rules`, with the parse budget and
    /// structured-parse switch from `config`.
    pub fn new(rules: ExtractionRules, config: &AnalyzerConfig) -> Result<Self, ParseError> {
        Ok(Self {
            parser: TolerantParser::from_config(config)?,
            endpoints: EndpointExtractor::new(rules)?,
            models: ModelExtractor::new()?,
            components: ComponentExtractor::new()?,
        })
    }

    /// Returns the rules endpoints are extracted with.
    #[must_use]
    pub const fn rules(&self) -> &ExtractionRules {
        self.endpoints.rules()
    }

    /// Returns this worker's parse failure counters.
    #[must_use]
    pub const fn counters(&self) -> ParseCounters {
        self.parser.counters()
    }

    /// Extracts every entity from one file.
    ///
    /// The component is extracted first so endpoints can record which
    /// component calls them.
    pub fn extract(&mut self, path: &Utf8Path, text: &str) -> FileExtraction {
        let parsed = self.parser.parse(text, SourceKind::from_path(path));
        let (tree, parse_failure) = match parsed {
            Ok(tree) => (Some(tree), None),
            Err(failure) => {
                if failure != ParseFailure::Disabled {
                    tracing::debug!(%path, %failure, "using pattern extraction");
                }
                (None, Some(failure))
            }
        };
        let unit = SourceUnit {
            path,
            text,
            tree: tree.as_ref(),
        };

        let mut components = self.components.extract(&unit, None);
        let context = components.first().map(|c| c.name.clone());
        let endpoints = self.endpoints.extract(&unit, context.as_deref());

        let mut models = self.models.extract(&unit, None);
        merge_body_models(&mut models, &endpoints);

        for component in &mut components {
            component
                .endpoints
                .extend(endpoints.iter().map(ApiEndpoint::key));
        }

        FileExtraction {
            endpoints,
            models,
            components,
            parse_failure,
        }
    }
}

/// Adds a model for every endpoint whose literal request body names one.
fn merge_body_models(models: &mut Vec<DataModel>, endpoints: &[ApiEndpoint]) {
    let mut by_name: BTreeMap<String, DataModel> = models
        .drain(..)
        .map(|m| (m.name.clone(), m))
        .collect();

    for endpoint in endpoints {
        let Some(name) = endpoint.request_model.as_deref() else {
            continue;
        };
        let mut model = DataModel::new(name);
        for (field, tags) in &endpoint.params {
            if endpoint.query_params.contains(field) {
                continue;
            }
            for tag in tags {
                model.add_field(field.as_str(), tag.clone(), false);
            }
        }
        if model.fields.is_empty() {
            continue;
        }
        model.locations.extend(endpoint.locations.iter().cloned());
        model.endpoints.insert(endpoint.url.clone());
        match by_name.get_mut(name) {
            Some(existing) => existing.merge(model),
            None => {
                by_name.insert(name.to_owned(), model);
            }
        }
    }
    models.extend(by_name.into_values());
}

#[cfg(test)]
mod tests {
    use xc_core::{HttpMethod, ObservedType};

    use super::*;

    const PAGE: &str = r"
import React, { useEffect, useState } from 'react';
import axios from 'axios';

export default function OrderPage({ orderId }) {
  const [order, setOrder] = useState(null);
  useEffect(() => {
    axios.get(`/api/orders/${orderId}`).then((r) => setOrder(r.data));
  }, [orderId]);
  const submit = (note) => axios.post('/api/orders', { note, quantity: 2 });
  return <button onClick={() => submit('x')}>{order?.id}</button>;
}
";

    fn extractor(structured: bool) -> FileExtractor {
        let config = AnalyzerConfig {
            use_structured_parse: structured,
            ..AnalyzerConfig::default()
        };
        FileExtractor::new(ExtractionRules::usage(), &config).unwrap()
    }

    #[test]
    fn test_component_links_endpoints() {
        let mut extractor = extractor(true);
        let extraction = extractor.extract(Utf8Path::new("src/pages/OrderPage.jsx"), PAGE);

        assert_eq!(extraction.parse_failure, None);
        assert_eq!(extraction.components.len(), 1);
        let page = &extraction.components[0];
        assert_eq!(page.name, "OrderPage");
        assert_eq!(page.endpoints.len(), 2);

        for endpoint in &extraction.endpoints {
            assert!(endpoint.components.contains("OrderPage"));
        }
    }

    #[test]
    fn test_request_body_becomes_model() {
        let mut extractor = extractor(true);
        let extraction = extractor.extract(Utf8Path::new("src/pages/OrderPage.jsx"), PAGE);

        let post = extraction
            .endpoints
            .iter()
            .find(|e| e.method == HttpMethod::Post)
            .unwrap();
        assert_eq!(post.request_model.as_deref(), Some("Order"));

        let order = extraction.models.iter().find(|m| m.name == "Order").unwrap();
        assert!(order.fields["quantity"].contains(&ObservedType::Number));
        assert!(order.endpoints.contains("/api/orders"));
    }

    #[test]
    fn test_disabled_parse_still_extracts() {
        let mut extractor = extractor(false);
        let extraction = extractor.extract(Utf8Path::new("src/pages/OrderPage.jsx"), PAGE);

        assert_eq!(extraction.parse_failure, Some(ParseFailure::Disabled));
        assert_eq!(extraction.endpoints.len(), 2);
        assert_eq!(extraction.components.len(), 1);
        assert_eq!(extractor.counters(), ParseCounters::default());
    }

    #[test]
    fn test_syntax_error_falls_back_and_counts() {
        let mut extractor = extractor(true);
        let source = "const broken = {{;\napi.get('/api/health');\n";
        let extraction = extractor.extract(Utf8Path::new("src/health.ts"), source);

        assert_eq!(extraction.parse_failure, Some(ParseFailure::Syntax));
        assert_eq!(extraction.endpoints.len(), 1);
        assert_eq!(extractor.counters().parse_errors, 1);
    }

    #[test]
    fn test_relocate_rewrites_every_location() {
        let mut extractor = extractor(true);
        let mut extraction = extractor.extract(Utf8Path::new("a/OrderPage.jsx"), PAGE);
        extraction.relocate(Utf8Path::new("b/OrderPage.jsx"));

        assert!(extraction
            .endpoints
            .iter()
            .flat_map(|e| &e.locations)
            .all(|l| l.file == "b/OrderPage.jsx"));
        assert_eq!(extraction.components[0].file, "b/OrderPage.jsx");
    }

    #[test]
    fn test_extraction_json_skips_parse_failure() {
        let extraction = FileExtraction {
            parse_failure: Some(ParseFailure::Timeout),
            ..FileExtraction::default()
        };
        let json = serde_json::to_string(&extraction).unwrap();
        let back: FileExtraction = serde_json::from_str(&json).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.parse_failure, None);
    }
}
