//! Resumable traversal state (spec.md §3 `Frame`, `TraverseSession`).

use crate::edge_order::EdgeOrdering;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A unit of pending traversal work.
///
/// `depth_remaining` counts hops still permitted from this node.
/// `next_edge_index` is the position, in the deterministically ordered edge
/// list of `node_uuid`, at which to resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub node_uuid: String,
    pub depth_remaining: u32,
    pub next_edge_index: usize,
}

impl Frame {
    pub fn new(node_uuid: impl Into<String>, depth_remaining: u32, next_edge_index: usize) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            depth_remaining,
            next_edge_index,
        }
    }
}

/// Traversal strategy. The spec names only `bfs`; the field exists so a
/// session's query fingerprint is self-describing and future strategies
/// don't require a schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Bfs,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Bfs
    }
}

/// The resumable state of one paginated BFS traversal.
///
/// Invariants (spec.md §3):
/// - `root_uuid ∈ visited` iff the traversal has begun.
/// - every `Frame::node_uuid ∈ visited`.
/// - `visited` has no duplicates.
/// - `yielded_edges` equals the total edges emitted across all prior pages.
/// - frames pop from the front and push to the back (FIFO), except a
///   budget-interrupted frame, which is reinserted at the front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraverseSession {
    // Immutable query fingerprint.
    pub root_uuid: String,
    pub max_depth: u32,
    pub strategy: Strategy,
    pub edge_ordering: EdgeOrdering,
    pub query_hash: String,
    /// Reserved for future cross-page snapshot isolation; not implemented
    /// (spec.md §9 Open Question ii). Readers must not assume cross-page
    /// read isolation regardless of this field's value.
    #[serde(default)]
    pub snapshot_as_of: Option<String>,

    // Mutable traversal state.
    #[serde(default)]
    pub frontier: VecDeque<Frame>,
    #[serde(default)]
    pub visited: Vec<String>,
    #[serde(default)]
    pub yielded_edges: u64,

    // Lifecycle metadata.
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_schema_version() -> u32 {
    1
}

impl TraverseSession {
    pub fn new(root_uuid: impl Into<String>, max_depth: u32, ttl: chrono::Duration) -> Self {
        let root_uuid = root_uuid.into();
        let now = Utc::now();
        Self {
            query_hash: query_hash(&root_uuid, max_depth),
            root_uuid,
            max_depth,
            strategy: Strategy::Bfs,
            edge_ordering: EdgeOrdering::Uuid,
            snapshot_as_of: None,
            frontier: VecDeque::new(),
            visited: Vec::new(),
            yielded_edges: 0,
            started_at: now,
            expires_at: now + ttl,
            schema_version: 1,
        }
    }

    pub fn has_begun(&self) -> bool {
        !self.visited.is_empty()
    }

    pub fn is_visited(&self, uuid: &str) -> bool {
        self.visited.iter().any(|v| v == uuid)
    }

    pub fn mark_visited(&mut self, uuid: impl Into<String>) {
        self.visited.push(uuid.into());
    }
}

/// Derive the query fingerprint bound into cursors for this session.
pub fn query_hash(root_uuid: &str, max_depth: u32) -> String {
    format!("{root_uuid}:{max_depth}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_empty_frontier_and_visited() {
        let sess = TraverseSession::new("A", 2, chrono::Duration::hours(1));
        assert!(sess.frontier.is_empty());
        assert!(sess.visited.is_empty());
        assert!(!sess.has_begun());
        assert_eq!(sess.query_hash, "A:2");
    }

    #[test]
    fn mark_visited_is_idempotent_in_membership_check() {
        let mut sess = TraverseSession::new("A", 1, chrono::Duration::hours(1));
        sess.mark_visited("A");
        assert!(sess.is_visited("A"));
        assert!(!sess.is_visited("B"));
    }

    #[test]
    fn expires_at_is_after_started_at() {
        let sess = TraverseSession::new("A", 1, chrono::Duration::seconds(30));
        assert!(sess.expires_at > sess.started_at);
    }

    #[test]
    fn query_hash_is_deterministic() {
        assert_eq!(query_hash("root-1", 3), query_hash("root-1", 3));
        assert_ne!(query_hash("root-1", 3), query_hash("root-1", 4));
    }

    #[test]
    fn frame_reinsert_keeps_fifo_at_back_for_new_frames() {
        let mut sess = TraverseSession::new("A", 2, chrono::Duration::hours(1));
        sess.frontier.push_back(Frame::new("A", 2, 0));
        sess.frontier.push_back(Frame::new("B", 1, 0));
        let front = sess.frontier.pop_front().unwrap();
        assert_eq!(front.node_uuid, "A");
        // A budget-interrupted frame goes back to the front, not the back.
        sess.frontier.push_front(Frame::new("A", 2, 3));
        assert_eq!(sess.frontier.front().unwrap().node_uuid, "A");
    }
}
