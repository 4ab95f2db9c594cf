//! Relationship graph: components → endpoints → models.
//!
//! ```text
//! Component ──imports──▶ Component
//!     │
//!     └──calls──▶ Endpoint ──references──▶ Model
//! ```
//!
//! The graph is rebuilt from an [`Inventory`] on every run. Building it is
//! the one step that writes back into the inventory: every model reached
//! through a `references` edge gets the endpoint URL added to
//! [`DataModel::endpoints`](xc_core::DataModel::endpoints).

use std::fmt::Write;

use camino::Utf8PathBuf;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Serialize, Serializer};
use tracing::debug;
use xc_core::{ComponentKey, EndpointKey, FxHashMap, FxHashSet, HttpMethod};
use xc_scanner::Inventory;
use xc_ts_parser::naming::{resource_to_model_name, singularize, to_pascal_case};

/// Shortest resource token matched against model names by substring.
const MIN_SUBSTRING_LEN: usize = 3;

/// Suffix appended to a node rendered a second time.
pub const CIRCULAR_MARKER: &str = "(circular reference)";

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphNode {
    /// A UI component.
    Component {
        /// Canonical component name.
        name: String,
        /// Defining file.
        file: Utf8PathBuf,
    },
    /// An endpoint identity.
    Endpoint {
        /// HTTP method.
        method: HttpMethod,
        /// URL template as extracted.
        url: String,
    },
    /// A data model.
    Model {
        /// Model name.
        name: String,
    },
}

impl GraphNode {
    /// Returns the text used for this node in a rendered tree.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Component { name, .. } | Self::Model { name } => name.clone(),
            Self::Endpoint { method, url } => format!("{method} {url}"),
        }
    }
}

/// The relationship an edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Component imports component.
    Imports,
    /// Component calls endpoint.
    Calls,
    /// Endpoint references model.
    References,
}

/// Directed graph over one inventory with lookup indices by identity.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    graph: DiGraph<GraphNode, EdgeKind>,
    components: FxHashMap<ComponentKey, NodeIndex>,
    endpoints: FxHashMap<EndpointKey, NodeIndex>,
    models: FxHashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    /// Builds the graph and registers referencing endpoint URLs on the
    /// models they reach.
    pub fn build(inventory: &mut Inventory) -> Self {
        let mut graph = Self::default();

        for component in inventory.components() {
            graph.component_node(&component.key());
        }
        for endpoint in inventory.endpoints() {
            graph.endpoint_node(&endpoint.key());
        }

        for component in inventory.components() {
            let from = graph.component_node(&component.key());
            for import in &component.imports {
                let stem = import.is_local().then(|| to_pascal_case(import.module_stem()));
                let targets = import
                    .names
                    .iter()
                    .map(String::as_str)
                    .chain(stem.as_deref())
                    .filter_map(|name| inventory.component_named(name));
                for target in targets {
                    let to = graph.component_node(&target.key());
                    if to != from {
                        graph.graph.update_edge(from, to, EdgeKind::Imports);
                    }
                }
            }
            for key in &component.endpoints {
                let to = graph.endpoint_node(key);
                graph.graph.update_edge(from, to, EdgeKind::Calls);
            }
        }

        let mut references: Vec<(String, String)> = Vec::new();
        for endpoint in inventory.endpoints() {
            let Some(resource) = endpoint.resource.as_deref() else {
                continue;
            };
            let from = graph.endpoint_node(&endpoint.key());
            for model in referenced_models(inventory, resource) {
                let to = graph.model_node(&model);
                graph.graph.update_edge(from, to, EdgeKind::References);
                references.push((model, endpoint.url.clone()));
            }
        }
        for (model, url) in references {
            if let Some(model) = inventory.model_mut(&model) {
                model.endpoints.insert(url);
            }
        }

        debug!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "Built relationship graph"
        );
        graph
    }

    fn component_node(&mut self, key: &ComponentKey) -> NodeIndex {
        if let Some(&index) = self.components.get(key) {
            return index;
        }
        let index = self.graph.add_node(GraphNode::Component {
            name: key.name.clone(),
            file: key.file.clone(),
        });
        self.components.insert(key.clone(), index);
        index
    }

    fn endpoint_node(&mut self, key: &EndpointKey) -> NodeIndex {
        if let Some(&index) = self.endpoints.get(key) {
            return index;
        }
        let index = self.graph.add_node(GraphNode::Endpoint {
            method: key.method,
            url: key.url.clone(),
        });
        self.endpoints.insert(key.clone(), index);
        index
    }

    fn model_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.models.get(name) {
            return index;
        }
        let index = self.graph.add_node(GraphNode::Model {
            name: name.to_owned(),
        });
        self.models.insert(name.to_owned(), index);
        index
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(index)
    }

    /// Returns the node of the first component named `name`, in file order.
    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<NodeIndex> {
        self.components
            .iter()
            .filter(|(key, _)| key.name == name)
            .min_by(|(a, _), (b, _)| a.file.cmp(&b.file))
            .map(|(_, &index)| index)
    }

    /// Returns the node of a model.
    #[must_use]
    pub fn find_model(&self, name: &str) -> Option<NodeIndex> {
        self.models.get(name).copied()
    }

    /// Returns the outgoing neighbors of `index` ordered by edge kind, then
    /// label.
    #[must_use]
    pub fn children(&self, index: NodeIndex) -> Vec<(EdgeKind, NodeIndex)> {
        let mut children: Vec<(EdgeKind, String, NodeIndex)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (*edge.weight(), self.graph[edge.target()].label(), edge.target()))
            .collect();
        children.sort();
        children
            .into_iter()
            .map(|(kind, _, target)| (kind, target))
            .collect()
    }

    /// Renders the subtree below the first component named `name`.
    ///
    /// A node reached a second time is printed once more as a leaf marked
    /// [`CIRCULAR_MARKER`] and not expanded.
    ///
    /// # Examples
    ///
    /// ```
    /// use xc_analysis::RelationshipGraph;
    /// use xc_core::{Component, EndpointKey, HttpMethod};
    /// use xc_scanner::Inventory;
    ///
    /// let mut page = Component::new("UserPage", "src/UserPage.tsx");
    /// page.endpoints.insert(EndpointKey::new(HttpMethod::Get, "/api/users/"));
    /// let mut inventory = Inventory::new();
    /// inventory.add_component(page);
    ///
    /// let graph = RelationshipGraph::build(&mut inventory);
    /// assert_eq!(
    ///     graph.render_tree("UserPage").unwrap(),
    ///     "UserPage\n└── GET /api/users/\n"
    /// );
    /// ```
    #[must_use]
    pub fn render_tree(&self, name: &str) -> Option<String> {
        let root = self.find_component(name)?;
        let mut out = String::new();
        let mut visited = FxHashSet::default();
        visited.insert(root);
        let _ = writeln!(out, "{}", self.graph[root].label());
        self.render_children(root, "", &mut visited, &mut out);
        Some(out)
    }

    fn render_children(
        &self,
        index: NodeIndex,
        prefix: &str,
        visited: &mut FxHashSet<NodeIndex>,
        out: &mut String,
    ) {
        let children = self.children(index);
        let last = children.len().saturating_sub(1);
        for (i, (_, child)) in children.into_iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let label = self.graph[child].label();
            if !visited.insert(child) {
                let _ = writeln!(out, "{prefix}{branch}{label} {CIRCULAR_MARKER}");
                continue;
            }
            let _ = writeln!(out, "{prefix}{branch}{label}");
            self.render_children(child, &format!("{prefix}{indent}"), visited, out);
        }
    }
}

/// Models an endpoint resource refers to: the exact singular model if one
/// exists, otherwise every model whose name contains the singular resource,
/// ignoring case.
fn referenced_models(inventory: &Inventory, resource: &str) -> Vec<String> {
    let exact = resource_to_model_name(resource);
    if inventory.model(&exact).is_some() {
        return vec![exact];
    }
    let singular = singularize(resource);
    if inventory.model(&singular).is_some() {
        return vec![singular];
    }

    let needle = singular.to_lowercase().replace(['-', '_'], "");
    if needle.len() < MIN_SUBSTRING_LEN {
        return Vec::new();
    }
    inventory
        .models()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .map(|m| m.name.clone())
        .collect()
}

/// Serialized as `{ "nodes": [...], "edges": [...] }` with node ids as
/// indices into `nodes`.
impl Serialize for RelationshipGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Node<'a> {
            id: usize,
            #[serde(flatten)]
            node: &'a GraphNode,
        }

        #[derive(Serialize)]
        struct Edge {
            from: usize,
            to: usize,
            kind: EdgeKind,
        }

        #[derive(Serialize)]
        struct View<'a> {
            nodes: Vec<Node<'a>>,
            edges: Vec<Edge>,
        }

        View {
            nodes: self
                .graph
                .node_indices()
                .map(|index| Node {
                    id: index.index(),
                    node: &self.graph[index],
                })
                .collect(),
            edges: self
                .graph
                .edge_references()
                .map(|edge| Edge {
                    from: edge.source().index(),
                    to: edge.target().index(),
                    kind: *edge.weight(),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use xc_core::{ApiEndpoint, Component, DataModel, ImportInfo, ImportKind};

    use super::*;

    fn import(source: &str, name: &str) -> ImportInfo {
        ImportInfo::new(source, ImportKind::Default, smallvec![name.to_owned()], 1)
    }

    fn component(name: &str, imports: &[(&str, &str)], calls: &[EndpointKey]) -> Component {
        let mut component = Component::new(name, format!("src/{name}.tsx"));
        for (source, binding) in imports {
            component.add_import(import(source, binding));
        }
        component.endpoints.extend(calls.iter().cloned());
        component
    }

    #[test]
    fn test_cycle_renders_circular_leaf() {
        let mut inventory = Inventory::new();
        inventory.add_component(component("X", &[("./Y", "Y")], &[]));
        inventory.add_component(component("Y", &[("./X", "X")], &[]));

        let graph = RelationshipGraph::build(&mut inventory);
        insta::assert_snapshot!(graph.render_tree("X").unwrap(), @r"
        X
        └── Y
            └── X (circular reference)
        ");
    }

    #[test]
    fn test_tree_with_endpoints_and_models() {
        let orders = EndpointKey::new(HttpMethod::Get, "/api/orders/");
        let order = EndpointKey::new(HttpMethod::Get, "/api/orders/{id}/");
        let mut inventory = Inventory::new();
        inventory.add_component(component(
            "OrderPage",
            &[("./OrderRow", "OrderRow")],
            &[orders.clone()],
        ));
        inventory.add_component(component("OrderRow", &[], &[order.clone()]));
        inventory.add_endpoint(ApiEndpoint::new(HttpMethod::Get, "/api/orders/"));
        inventory.add_endpoint(ApiEndpoint::new(HttpMethod::Get, "/api/orders/{id}/"));
        inventory.add_model(DataModel::new("Order"));

        let graph = RelationshipGraph::build(&mut inventory);
        insta::assert_snapshot!(graph.render_tree("OrderPage").unwrap(), @r"
        OrderPage
        ├── OrderRow
        │   └── GET /api/orders/{id}/
        │       └── Order
        └── GET /api/orders/
            └── Order (circular reference)
        ");

        let order_model = inventory.model("Order").unwrap();
        assert!(order_model.endpoints.contains("/api/orders/"));
        assert!(order_model.endpoints.contains("/api/orders/{id}/"));
    }

    #[test]
    fn test_import_resolved_by_module_stem() {
        let mut inventory = Inventory::new();
        inventory.add_component(component("Page", &[("../widgets/user-card", "Card")], &[]));
        inventory.add_component(component("UserCard", &[], &[]));

        let graph = RelationshipGraph::build(&mut inventory);
        let page = graph.find_component("Page").unwrap();
        let user_card = graph.find_component("UserCard").unwrap();
        assert_eq!(graph.children(page), [(EdgeKind::Imports, user_card)]);
    }

    #[test]
    fn test_package_import_stem_not_resolved() {
        let mut inventory = Inventory::new();
        inventory.add_component(component("Page", &[("react-router", "Link")], &[]));
        inventory.add_component(component("ReactRouter", &[], &[]));

        let graph = RelationshipGraph::build(&mut inventory);
        let page = graph.find_component("Page").unwrap();
        assert!(graph.children(page).is_empty());
    }

    #[test]
    fn test_substring_reference() {
        let mut inventory = Inventory::new();
        inventory.add_endpoint(ApiEndpoint::new(HttpMethod::Get, "/api/profiles/"));
        inventory.add_model(DataModel::new("UserProfile"));
        inventory.add_model(DataModel::new("Invoice"));

        let graph = RelationshipGraph::build(&mut inventory);
        assert!(graph.find_model("UserProfile").is_some());
        assert!(graph.find_model("Invoice").is_none());
        assert!(inventory.model("UserProfile").unwrap().endpoints.contains("/api/profiles/"));
    }

    #[test]
    fn test_unknown_component_renders_nothing() {
        let mut inventory = Inventory::new();
        let graph = RelationshipGraph::build(&mut inventory);
        assert!(graph.render_tree("Missing").is_none());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_serializes_nodes_and_edges() {
        let key = EndpointKey::new(HttpMethod::Post, "/api/users/");
        let mut inventory = Inventory::new();
        inventory.add_component(component("Signup", &[], &[key]));

        let graph = RelationshipGraph::build(&mut inventory);
        let json = serde_json::to_value(&graph).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "edges": [
            {
              "from": 0,
              "kind": "calls",
              "to": 1
            }
          ],
          "nodes": [
            {
              "file": "src/Signup.tsx",
              "id": 0,
              "kind": "component",
              "name": "Signup"
            },
            {
              "id": 1,
              "kind": "endpoint",
              "method": "POST",
              "url": "/api/users/"
            }
          ]
        }
        "#);
    }
}
