//! The paginated BFS engine (C6): advances a [`TraverseSession`] by exactly
//! one page, stopping either when the frontier is exhausted or when adding
//! the next edge would exceed the token budget.
//!
//! This is the part of the crate where correctness is entirely about doing
//! the bookkeeping in exactly the right order: the frame only goes back
//! onto the frontier, at the front, with its `next_edge_index` pointing at
//! the edge that didn't fit. Nothing before that edge is re-emitted on the
//! next page, and nothing after it has been looked at yet.

use crate::edge_order::order_edges;
use crate::format::{format_edge, format_node, FlatEdge, NodeRecord};
use crate::model::Edge;
use crate::session::{Frame, TraverseSession};
use crate::store::{GraphStore, StoreError};
use crate::token_budget::TokenBudget;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One page of traversal output: the flat node/edge collections the
/// wrapper assembles into the public response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageResult {
    pub nodes: HashMap<String, NodeRecord>,
    pub edges: Vec<FlatEdge>,
}

impl PageResult {
    fn estimator_view(&self) -> TentativeView<'_> {
        TentativeView {
            nodes: &self.nodes,
            edges: &self.edges,
        }
    }
}

/// Borrowed shape mirrored for budget estimation without cloning the
/// accumulated page on every edge considered.
#[derive(Serialize)]
struct TentativeView<'a> {
    nodes: &'a HashMap<String, NodeRecord>,
    edges: &'a Vec<FlatEdge>,
}

/// Advance `session` by one page against `store`, respecting `budget`.
///
/// Returns the page and whether more pages remain. `budget` is consumed:
/// callers that want to know the final token usage should call
/// [`TokenBudget::used`] (via `estimate` on the returned page, since the
/// engine does not mutate the budget's counters — see note below) after
/// this returns.
///
/// Note: unlike a running counter, the budget check here re-estimates the
/// whole tentative page on each candidate edge, because token counts are
/// not additive across JSON structural boundaries (a new key changes
/// brace/comma overhead for the whole object). `budget` only supplies the
/// limit and the estimator; `TokenBudget::add`/`used` are not called by
/// this function.
pub async fn advance(
    session: &mut TraverseSession,
    store: &dyn GraphStore,
    budget: &TokenBudget,
) -> Result<(PageResult, bool), EngineError> {
    let mut page = PageResult::default();

    if !session.has_begun() {
        session.mark_visited(session.root_uuid.clone());
        let root_record = match store.get_node(&session.root_uuid).await {
            Ok(Some(node)) => format_node(&node),
            Ok(None) => NodeRecord::not_found(session.root_uuid.clone()),
            Err(e) => {
                tracing::warn!(uuid = %session.root_uuid, error = %e, "get_node failed, reporting as not found");
                NodeRecord::not_found(session.root_uuid.clone())
            }
        };
        page.nodes.insert(session.root_uuid.clone(), root_record);

        if session.max_depth > 0 {
            session
                .frontier
                .push_back(Frame::new(session.root_uuid.clone(), session.max_depth, 0));
        }

        if session.max_depth == 0 {
            return Ok((page, false));
        }
    }

    while let Some(mut frame) = session.frontier.pop_front() {
        let mut edges: Vec<Edge> = match store.edges_incident(&frame.node_uuid).await {
            Ok(edges) => edges,
            Err(e) => {
                tracing::warn!(uuid = %frame.node_uuid, error = %e, "edges_incident failed, swallowing to empty");
                Vec::new()
            }
        };
        if edges.is_empty() {
            continue;
        }
        order_edges(&mut edges, &frame.node_uuid, session.edge_ordering);

        let mut i = frame.next_edge_index;
        while i < edges.len() {
            let edge = &edges[i];
            let target_uuid = edge.other_endpoint(&frame.node_uuid).to_string();
            let current_depth = session.max_depth - frame.depth_remaining + 1;
            let edge_flat = format_edge(edge, current_depth, session.yielded_edges);

            if !session.is_visited(&target_uuid) {
                let target_record = match store.get_node(&target_uuid).await {
                    Ok(Some(node)) => format_node(&node),
                    Ok(None) => NodeRecord::not_found(target_uuid.clone()),
                    Err(e) => {
                        tracing::warn!(uuid = %target_uuid, error = %e, "get_node failed, reporting as not found");
                        NodeRecord::not_found(target_uuid.clone())
                    }
                };

                let mut tentative_nodes = page.nodes.clone();
                tentative_nodes.insert(target_uuid.clone(), target_record.clone());
                let mut tentative_edges = page.edges.clone();
                tentative_edges.push(edge_flat.clone());
                let tentative = TentativeView {
                    nodes: &tentative_nodes,
                    edges: &tentative_edges,
                };

                if budget.estimate(&tentative) <= budget.limit() {
                    page.nodes.insert(target_uuid.clone(), target_record);
                    page.edges.push(edge_flat);
                    session.yielded_edges += 1;
                    session.mark_visited(target_uuid.clone());

                    if frame.depth_remaining > 1 {
                        session
                            .frontier
                            .push_back(Frame::new(target_uuid, frame.depth_remaining - 1, 0));
                    }
                    i += 1;
                } else {
                    frame.next_edge_index = i;
                    session.frontier.push_front(frame);
                    return Ok((page, true));
                }
            } else {
                let view = page.estimator_view();
                let mut tentative_edges = view.edges.clone();
                tentative_edges.push(edge_flat.clone());
                let tentative = TentativeView {
                    nodes: view.nodes,
                    edges: &tentative_edges,
                };

                if budget.estimate(&tentative) <= budget.limit() {
                    page.edges.push(edge_flat);
                    session.yielded_edges += 1;
                    i += 1;
                } else {
                    frame.next_edge_index = i;
                    session.frontier.push_front(frame);
                    return Ok((page, true));
                }
            }
        }
    }

    Ok((page, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};
    use crate::store::PathRecord;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;

    struct FixtureStore {
        nodes: StdHashMap<String, Node>,
        edges: StdHashMap<String, Vec<Edge>>,
        edge_calls: Mutex<Vec<String>>,
        fail_node_fetch: StdHashMap<String, ()>,
        fail_edges_for: StdHashMap<String, ()>,
    }

    impl FixtureStore {
        fn new() -> Self {
            Self {
                nodes: StdHashMap::new(),
                edges: StdHashMap::new(),
                edge_calls: Mutex::new(Vec::new()),
                fail_node_fetch: StdHashMap::new(),
                fail_edges_for: StdHashMap::new(),
            }
        }

        fn failing_node_fetch(mut self, uuid: &str) -> Self {
            self.fail_node_fetch.insert(uuid.to_string(), ());
            self
        }

        fn failing_edges_for(mut self, uuid: &str) -> Self {
            self.fail_edges_for.insert(uuid.to_string(), ());
            self
        }

        fn with_node(mut self, uuid: &str, name: &str) -> Self {
            self.nodes.insert(
                uuid.to_string(),
                Node {
                    uuid: uuid.to_string(),
                    name: name.to_string(),
                    summary: String::new(),
                    labels: vec!["Entity".to_string()],
                    group_id: "g".to_string(),
                    created_at: None,
                    attributes: StdHashMap::new(),
                    kind: NodeKind::Entity,
                },
            );
            self
        }

        fn with_edge(mut self, uuid: &str, relation: &str, source: &str, target: &str) -> Self {
            let edge = Edge {
                uuid: uuid.to_string(),
                relation_type: relation.to_string(),
                fact: String::new(),
                source_uuid: source.to_string(),
                target_uuid: target.to_string(),
                episodes: vec![],
                created_at: None,
                valid_at: None,
                invalid_at: None,
            };
            self.edges.entry(source.to_string()).or_default().push(edge.clone());
            self.edges.entry(target.to_string()).or_default().push(edge);
            self
        }
    }

    #[async_trait]
    impl GraphStore for FixtureStore {
        async fn get_node(&self, uuid: &str) -> Result<Option<Node>, StoreError> {
            if self.fail_node_fetch.contains_key(uuid) {
                return Err(StoreError::Backend(format!("simulated backend failure for {uuid}")));
            }
            Ok(self.nodes.get(uuid).cloned())
        }

        async fn edges_incident(&self, uuid: &str) -> Result<Vec<Edge>, StoreError> {
            self.edge_calls.lock().unwrap().push(uuid.to_string());
            if self.fail_edges_for.contains_key(uuid) {
                return Err(StoreError::Backend(format!("simulated backend failure for {uuid}")));
            }
            Ok(self.edges.get(uuid).cloned().unwrap_or_default())
        }

        async fn find_paths(
            &self,
            _source: &str,
            _target: &str,
            _max_depth: u32,
            _max_paths: usize,
        ) -> Result<Vec<PathRecord>, StoreError> {
            Ok(vec![])
        }

        async fn neighborhood(&self, _seeds: &[String], _max_hop: u32) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
            Ok((vec![], vec![]))
        }
    }

    fn unlimited_budget() -> TokenBudget {
        TokenBudget::new(usize::MAX)
    }

    #[tokio::test]
    async fn first_page_with_no_edges_returns_only_root() {
        let store = FixtureStore::new().with_node("A", "Alice");
        let mut session = TraverseSession::new("A", 2, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        assert_eq!(page.nodes.len(), 1);
        assert!(page.edges.is_empty());
    }

    #[tokio::test]
    async fn depth_zero_yields_no_frontier_and_no_edges() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_edge("E1", "KNOWS", "A", "B");
        let mut session = TraverseSession::new("A", 0, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        assert_eq!(page.nodes.len(), 1);
        assert!(page.edges.is_empty());
        assert!(session.frontier.is_empty());
    }

    #[tokio::test]
    async fn missing_root_node_is_reported_as_error_record() {
        let store = FixtureStore::new();
        let mut session = TraverseSession::new("ghost", 1, chrono::Duration::hours(1));
        let (page, _has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        match page.nodes.get("ghost").unwrap() {
            NodeRecord::Error { error, .. } => assert_eq!(error, "Node not found"),
            NodeRecord::Found(_) => panic!("expected error record"),
        }
    }

    #[tokio::test]
    async fn edges_expand_frontier_and_mark_targets_visited() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_node("C", "Carol")
            .with_edge("E1", "KNOWS", "A", "B")
            .with_edge("E2", "KNOWS", "B", "C");
        let mut session = TraverseSession::new("A", 2, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        assert_eq!(page.nodes.len(), 3);
        assert_eq!(page.edges.len(), 2);
        assert!(session.is_visited("C"));
    }

    #[tokio::test]
    async fn cycle_is_not_reprocessed_as_a_new_frame() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_edge("E1", "KNOWS", "A", "B")
            .with_edge("E2", "KNOWS", "B", "A");
        let mut session = TraverseSession::new("A", 3, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        // Both directed edges are distinct edges and both get emitted, but B
        // is only ever enqueued once, and A is never re-enqueued as a frame.
        assert_eq!(page.edges.len(), 2);
        assert_eq!(page.nodes.len(), 2);
        assert!(session.frontier.is_empty());
    }

    #[tokio::test]
    async fn budget_interruption_reinserts_frame_at_front_with_resume_index() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_node("C", "Carol")
            .with_edge("E1", "KNOWS", "A", "B")
            .with_edge("E2", "KNOWS", "A", "C");

        // First call with a generous budget seeds visited={A}; second call
        // with a budget that can only fit the first edge.
        let mut session = TraverseSession::new("A", 1, chrono::Duration::hours(1));
        let tiny = TokenBudget::new(1);
        let (page, has_more) = advance(&mut session, &store, &tiny).await.unwrap();

        assert!(has_more);
        assert_eq!(page.edges.len(), 0);
        let frame = session.frontier.front().expect("frame retained");
        assert_eq!(frame.node_uuid, "A");
        assert_eq!(frame.next_edge_index, 0);
    }

    #[tokio::test]
    async fn second_call_resumes_from_saved_edge_index_without_reprocessing_root() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_edge("E1", "KNOWS", "A", "B");
        let mut session = TraverseSession::new("A", 1, chrono::Duration::hours(1));
        let big = unlimited_budget();
        let (first_page, has_more) = advance(&mut session, &store, &big).await.unwrap();
        assert!(!has_more);
        assert_eq!(first_page.nodes.len(), 2);

        // A second call against an exhausted frontier is a no-op page.
        let (second_page, has_more2) = advance(&mut session, &store, &big).await.unwrap();
        assert!(!has_more2);
        assert!(second_page.nodes.is_empty());
        assert!(second_page.edges.is_empty());
    }

    #[tokio::test]
    async fn root_node_fetch_error_is_reported_as_error_record_not_propagated() {
        let store = FixtureStore::new().failing_node_fetch("A");
        let mut session = TraverseSession::new("A", 1, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        match page.nodes.get("A").unwrap() {
            NodeRecord::Error { .. } => {}
            NodeRecord::Found(_) => panic!("expected error record"),
        }
    }

    #[tokio::test]
    async fn target_node_fetch_error_is_reported_as_error_record_not_propagated() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_edge("E1", "KNOWS", "A", "B")
            .failing_node_fetch("B");
        let mut session = TraverseSession::new("A", 1, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        match page.nodes.get("B").unwrap() {
            NodeRecord::Error { .. } => {}
            NodeRecord::Found(_) => panic!("expected error record"),
        }
        assert_eq!(page.edges.len(), 1, "the edge is still emitted even though the target node fetch failed");
    }

    #[tokio::test]
    async fn edges_incident_error_is_swallowed_to_empty_and_does_not_propagate() {
        let store = FixtureStore::new()
            .with_node("A", "Alice")
            .with_node("B", "Bob")
            .with_edge("E1", "KNOWS", "A", "B")
            .failing_edges_for("A");
        let mut session = TraverseSession::new("A", 2, chrono::Duration::hours(1));
        let (page, has_more) = advance(&mut session, &store, &unlimited_budget()).await.unwrap();
        assert!(!has_more);
        assert_eq!(page.nodes.len(), 1, "only the root resolves; A's edges were swallowed, so B is never reached");
        assert!(page.edges.is_empty());
    }
}
