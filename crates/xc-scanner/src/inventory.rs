//! Entity registries for one side of a comparison.
//!
//! An [`Inventory`] holds every endpoint, model and component extracted from
//! one codebase, each keyed by its identity. Absorbing a second extraction of
//! the same identity merges into the existing entry, so an endpoint called
//! from two files is one endpoint with two locations.
//!
//! # Examples
//!
//! ```
//! use xc_core::{ApiEndpoint, HttpMethod, SourceLocation};
//! use xc_scanner::Inventory;
//! use xc_ts_parser::FileExtraction;
//!
//! let call = |file: &str| {
//!     let mut endpoint = ApiEndpoint::new(HttpMethod::Get, "/items/");
//!     endpoint.locations.insert(SourceLocation::new(file, 1));
//!     FileExtraction { endpoints: vec![endpoint], ..FileExtraction::default() }
//! };
//!
//! let mut inventory = Inventory::new();
//! inventory.absorb(call("a.ts"));
//! inventory.absorb(call("b.ts"));
//! assert_eq!(inventory.endpoint_count(), 1);
//! ```

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use xc_core::{ApiEndpoint, Component, ComponentKey, DataModel, EndpointKey};
use xc_ts_parser::FileExtraction;

/// Endpoints, models and components keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    endpoints: BTreeMap<EndpointKey, ApiEndpoint>,
    models: BTreeMap<String, DataModel>,
    components: BTreeMap<ComponentKey, Component>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges everything extracted from one file.
    pub fn absorb(&mut self, extraction: FileExtraction) {
        for endpoint in extraction.endpoints {
            self.add_endpoint(endpoint);
        }
        for model in extraction.models {
            self.add_model(model);
        }
        for component in extraction.components {
            self.add_component(component);
        }
    }

    /// Merges another inventory into this one.
    pub fn merge(&mut self, other: Self) {
        for endpoint in other.endpoints.into_values() {
            self.add_endpoint(endpoint);
        }
        for model in other.models.into_values() {
            self.add_model(model);
        }
        for component in other.components.into_values() {
            self.add_component(component);
        }
    }

    /// Adds an endpoint, merging by `(method, url)`.
    pub fn add_endpoint(&mut self, endpoint: ApiEndpoint) {
        match self.endpoints.get_mut(&endpoint.key()) {
            Some(existing) => existing.merge(endpoint),
            None => {
                self.endpoints.insert(endpoint.key(), endpoint);
            }
        }
    }

    /// Adds a model, merging by name.
    pub fn add_model(&mut self, model: DataModel) {
        match self.models.get_mut(&model.name) {
            Some(existing) => existing.merge(model),
            None => {
                self.models.insert(model.name.clone(), model);
            }
        }
    }

    /// Adds a component, merging by `(name, file)`.
    pub fn add_component(&mut self, component: Component) {
        match self.components.get_mut(&component.key()) {
            Some(existing) => existing.merge(component),
            None => {
                self.components.insert(component.key(), component);
            }
        }
    }

    /// Iterates endpoints in identity order.
    pub fn endpoints(&self) -> impl Iterator<Item = &ApiEndpoint> {
        self.endpoints.values()
    }

    /// Iterates models in name order.
    pub fn models(&self) -> impl Iterator<Item = &DataModel> {
        self.models.values()
    }

    /// Iterates components in identity order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Looks an endpoint up by identity.
    #[must_use]
    pub fn endpoint(&self, key: &EndpointKey) -> Option<&ApiEndpoint> {
        self.endpoints.get(key)
    }

    /// Looks a model up by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&DataModel> {
        self.models.get(name)
    }

    /// Looks a model up by name for mutation.
    pub fn model_mut(&mut self, name: &str) -> Option<&mut DataModel> {
        self.models.get_mut(name)
    }

    /// Returns the first component named `name`, in file order.
    #[must_use]
    pub fn component_named(&self, name: &str) -> Option<&Component> {
        self.components.values().find(|c| c.name == name)
    }

    /// Returns the number of distinct endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns the number of distinct models.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Returns the number of distinct components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.models.is_empty() && self.components.is_empty()
    }
}

/// Serialized as three lists in identity order.
impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Lists<'a> {
            endpoints: Vec<&'a ApiEndpoint>,
            models: Vec<&'a DataModel>,
            components: Vec<&'a Component>,
        }

        Lists {
            endpoints: self.endpoints().collect(),
            models: self.models().collect(),
            components: self.components().collect(),
        }
        .serialize(serializer)
    }
}
