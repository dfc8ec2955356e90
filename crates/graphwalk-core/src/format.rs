//! Projects store entities into stable wire-format records (C3).
//!
//! No embeddings or internal identifiers leak into the wire shape. Missing
//! optional fields are emitted as `null` or empty containers, never
//! omitted, so downstream consumers never have to distinguish "absent key"
//! from "empty value".

use crate::model::{Edge, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Wire record for a node. `Found` is the common case; `Error` is emitted
/// when the store could not resolve a UUID (spec.md §4.6 failure
/// semantics), and is a terminal: the engine never recurses through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRecord {
    Found(FlatNode),
    Error { uuid: String, error: String },
}

impl NodeRecord {
    pub fn not_found(uuid: impl Into<String>) -> Self {
        Self::Error {
            uuid: uuid.into(),
            error: "Node not found".to_string(),
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            Self::Found(node) => &node.uuid,
            Self::Error { uuid, .. } => uuid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub uuid: String,
    pub name: String,
    pub summary: String,
    pub labels: Vec<String>,
    pub group_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub attributes: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatEdge {
    pub id: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub fact: String,
    pub source: String,
    pub target: String,
    pub episodes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub valid_at: Option<DateTime<Utc>>,
    pub invalid_at: Option<DateTime<Utc>>,
    pub depth: u32,
    pub order: u64,
}

/// Project a store [`Node`] into its wire shape.
pub fn format_node(node: &Node) -> NodeRecord {
    NodeRecord::Found(FlatNode {
        uuid: node.uuid.clone(),
        name: node.name.clone(),
        summary: node.summary.clone(),
        labels: node.labels.clone(),
        group_id: node.group_id.clone(),
        created_at: node.created_at,
        attributes: node.attributes.clone(),
    })
}

/// Project a store [`Edge`] into its wire shape.
///
/// `edge_id` follows `"E:<source>:<target>:<ordinal>"`; `depth` is the hop
/// distance of the emitting frame (1-indexed); `order` is the session's
/// `yielded_edges` counter at the moment of emission.
pub fn format_edge(edge: &Edge, depth: u32, order: u64) -> FlatEdge {
    FlatEdge {
        id: format!("E:{}:{}:{}", edge.source_uuid, edge.target_uuid, order),
        relation_type: edge.relation_type.clone(),
        fact: edge.fact.clone(),
        source: edge.source_uuid.clone(),
        target: edge.target_uuid.clone(),
        episodes: edge.episodes.clone(),
        created_at: edge.created_at,
        valid_at: edge.valid_at,
        invalid_at: edge.invalid_at,
        depth,
        order,
    }
}
