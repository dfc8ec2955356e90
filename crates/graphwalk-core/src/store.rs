//! The `GraphStore` collaborator: everything the engine needs from a graph
//! backend, typed rather than expressed as passthrough query templates (see
//! the REDESIGN FLAG in DESIGN.md). A real backend lives outside this crate;
//! `graphwalk-store` ships the in-memory reference implementation used by
//! the CLI and MCP server.

use crate::model::{Edge, Node};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// A fully materialized path between two nodes, alternating node and edge
/// UUIDs starting and ending on a node: `[n0, e0, n1, e1, ..., nk]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub node_uuids: Vec<String>,
    pub edge_uuids: Vec<String>,
}

impl PathRecord {
    pub fn hop_count(&self) -> usize {
        self.edge_uuids.len()
    }
}

/// Read-only view of a graph backend, scoped to what traversal, path
/// search, and subgraph construction need.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fetch a single node by UUID, or `None` if it does not exist.
    async fn get_node(&self, uuid: &str) -> Result<Option<Node>, StoreError>;

    /// All edges with `uuid` as either endpoint, in unspecified order (the
    /// engine is responsible for deterministic ordering via `edge_order`).
    async fn edges_incident(&self, uuid: &str) -> Result<Vec<Edge>, StoreError>;

    /// All simple paths between `source` and `target` of at most
    /// `max_depth` hops, in unspecified order, capped at `max_paths`
    /// results from the backend's perspective (the backend MAY return
    /// fewer; it MUST NOT be relied on to return a canonical subset).
    async fn find_paths(
        &self,
        source: &str,
        target: &str,
        max_depth: u32,
        max_paths: usize,
    ) -> Result<Vec<PathRecord>, StoreError>;

    /// All non-Episodic nodes reachable from any of `seeds` within
    /// `max_hop` hops, together with the edges among them. Used to build a
    /// bounded neighborhood subgraph; a store MAY return the union across
    /// all seeds in one pass rather than requiring the caller to merge
    /// per-seed results.
    async fn neighborhood(&self, seeds: &[String], max_hop: u32) -> Result<(Vec<Node>, Vec<Edge>), StoreError>;
}
