//! Store-facing data model: the node/edge shapes the BFS engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Distinguishes an `Entity` node from an `Episodic` node in the backing
/// store. `build_subgraph` and neighborhood expansion only ever surface
/// `Entity` nodes; `Episodic` is carried so a store implementation can
/// filter without resorting to label string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Entity,
    Episodic,
}

/// A node as consumed by the traversal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub group_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default = "default_node_kind")]
    pub kind: NodeKind,
}

fn default_node_kind() -> NodeKind {
    NodeKind::Entity
}

impl Node {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            summary: String::new(),
            labels: vec!["Entity".to_string()],
            group_id: group_id.into(),
            created_at: None,
            attributes: HashMap::new(),
            kind: NodeKind::Entity,
        }
    }
}

/// An edge as consumed by the traversal engine. Edges are undirected for
/// traversal purposes: from a focus node, the "other endpoint" is whichever
/// of `source_uuid`/`target_uuid` is not the focus node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub uuid: String,
    /// Relation type, e.g. "RELATES_TO".
    pub relation_type: String,
    pub fact: String,
    pub source_uuid: String,
    pub target_uuid: String,
    #[serde(default)]
    pub episodes: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalid_at: Option<DateTime<Utc>>,
}

impl Edge {
    /// The endpoint of this edge that is not `focus_uuid`.
    ///
    /// Self-loops (`source_uuid == target_uuid`) return `focus_uuid` itself,
    /// matching spec.md's "self-loops are emitted with target = source"
    /// edge policy.
    pub fn other_endpoint(&self, focus_uuid: &str) -> &str {
        if self.source_uuid == focus_uuid {
            &self.target_uuid
        } else {
            &self.source_uuid
        }
    }
}
