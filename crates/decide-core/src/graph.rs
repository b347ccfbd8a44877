//! Organization graph as served by the backend, and its normalization.
//!
//! The backend's node and edge arrays are not guaranteed to agree: edges
//! may point at `domain-<name>` aliases of upper-cased domain nodes, or at
//! nodes outside the returned window. [`Graph::normalize`] resolves what it
//! can and drops the rest, so every edge of a normalized graph joins two
//! known nodes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DOMAIN_ALIAS_PREFIX: &str = "domain-";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl GraphNode {
    /// Display name: `properties.name`, then `properties.label`, then the
    /// node's own name, then its id. Empty strings are skipped.
    pub fn display_name(&self) -> &str {
        let prop = |key: &str| {
            self.properties
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        prop("name")
            .or_else(|| prop("label"))
            .or_else(|| Some(self.name.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl GraphEdge {
    pub fn kind(&self) -> EdgeKind {
        EdgeKind::from_tag(self.edge_type.as_deref())
    }
}

/// Color class of an edge, derived from its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Project,
    Risk,
    Budget,
    Other,
}

impl EdgeKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("project") => EdgeKind::Project,
            Some("risk") => EdgeKind::Risk,
            Some("budget") => EdgeKind::Budget,
            _ => EdgeKind::Other,
        }
    }
}

/// Raw node/edge arrays as returned by the graph endpoints. Missing arrays
/// read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphPayload {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A normalized graph: display names resolved, every edge endpoint known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn normalize(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let nodes: Vec<GraphNode> = nodes
            .into_iter()
            .map(|mut node| {
                node.name = node.display_name().to_string();
                node
            })
            .collect();

        let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let total = edges.len();
        let edges: Vec<GraphEdge> = edges
            .into_iter()
            .filter_map(|mut edge| {
                let source = resolve_endpoint(&known, &edge.source)?;
                let target = resolve_endpoint(&known, &edge.target)?;
                edge.source = source;
                edge.target = target;
                Some(edge)
            })
            .collect();

        if edges.len() < total {
            tracing::debug!(
                dropped = total - edges.len(),
                kept = edges.len(),
                "dropped graph edges with unknown endpoints"
            );
        }

        Graph { nodes, edges }
    }

    pub fn from_payload(payload: GraphPayload) -> Self {
        Self::normalize(payload.nodes, payload.edges)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Exact id match, else a `domain-xxx` alias of node `XXX`.
fn resolve_endpoint(known: &HashSet<&str>, value: &str) -> Option<String> {
    if known.contains(value) {
        return Some(value.to_string());
    }
    let alias = value.strip_prefix(DOMAIN_ALIAS_PREFIX)?.to_uppercase();
    known.contains(alias.as_str()).then_some(alias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn display_name_priority_chain() {
        let mut n = node("p-1");
        assert_eq!(n.display_name(), "p-1");
        n.name = "Given".to_string();
        assert_eq!(n.display_name(), "Given");
        n.properties.insert("label".to_string(), json!("Label"));
        assert_eq!(n.display_name(), "Label");
        n.properties.insert("name".to_string(), json!("Prop"));
        assert_eq!(n.display_name(), "Prop");
    }

    #[test]
    fn non_string_name_property_is_skipped() {
        let mut n = node("p-1");
        n.properties.insert("name".to_string(), json!(42));
        n.name = "Given".to_string();
        assert_eq!(n.display_name(), "Given");
    }

    #[test]
    fn unresolved_alias_is_dropped() {
        let g = Graph::normalize(vec![node("p-1")], vec![edge("domain-legal", "p-1")]);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn alias_only_applies_to_prefixed_ids() {
        let g = Graph::normalize(vec![node("PRIVACY"), node("p-1")], vec![edge("privacy", "p-1")]);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn edge_kinds() {
        assert_eq!(EdgeKind::from_tag(Some("risk")), EdgeKind::Risk);
        assert_eq!(EdgeKind::from_tag(Some("PROJECT")), EdgeKind::Project);
        assert_eq!(EdgeKind::from_tag(Some("mentor")), EdgeKind::Other);
        assert_eq!(EdgeKind::from_tag(None), EdgeKind::Other);
    }

    #[test]
    fn payload_with_missing_arrays_parses_empty() {
        let payload: GraphPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.is_empty());
    }
}
