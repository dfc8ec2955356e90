//! Exposes the four `graphwalk-core` operations as MCP tools over stdio.
//!
//! The transport framing (stdio read loop, JSON-RPC envelope) is entirely
//! `rmcp`'s; this crate only declares tool schemas and forwards calls into
//! `graphwalk-core`, mapping its typed errors onto `McpError`.

use graphwalk_core::{GraphStore, TraverseRuntime};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Bundles a graph backend with the traversal runtime (session store +
/// cursor codec) that a single MCP server process holds for its lifetime.
#[derive(Clone)]
pub struct GraphwalkServer {
    store: Arc<dyn GraphStore>,
    runtime: TraverseRuntime,
    tool_router: ToolRouter<Self>,
}

impl GraphwalkServer {
    pub fn new(store: Arc<dyn GraphStore>, cursor_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            runtime: TraverseRuntime::new(cursor_secret),
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TraverseRequest {
    /// UUID of the root entity to begin traversal from. Required for a new
    /// traversal; omit when resuming via `cursor`.
    start_node_uuid: Option<String>,
    /// Maximum BFS depth for a new traversal, 0-5. Defaults to 1.
    depth: Option<u32>,
    /// Opaque continuation cursor from a previous page whose `has_more`
    /// was true. When present, `start_node_uuid` and `depth` are ignored.
    cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FindPathsRequest {
    /// UUID of the source entity.
    from_uuid: String,
    /// UUID of the target entity.
    to_uuid: String,
    /// Maximum path length in hops, 1-5. Defaults to 5.
    max_depth: Option<u32>,
    /// Maximum number of paths to return.
    max_paths: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SubgraphRequest {
    /// UUIDs of the seed entities the subgraph is built around.
    entity_uuids: Vec<String>,
    /// Maximum hop distance from any seed, 0-3. Defaults to 1.
    max_hop: Option<u32>,
    /// Whether to additionally compute short paths between pairs of seeds.
    /// Defaults to true.
    include_paths: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RelationsRequest {
    /// UUID of the entity whose incident facts (edges) to list.
    entity_uuid: String,
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl GraphwalkServer {
    #[tool(
        description = "Paginated breadth-first traversal from a root entity. Returns a bounded page of nodes and edges plus a continuation cursor when the response would exceed the per-call token budget; pass that cursor back as `cursor` to fetch the next page of the same traversal."
    )]
    async fn traverse(&self, Parameters(req): Parameters<TraverseRequest>) -> Result<CallToolResult, McpError> {
        let response = self
            .runtime
            .traverse(
                self.store.as_ref(),
                req.start_node_uuid.as_deref(),
                req.depth,
                req.cursor.as_deref(),
            )
            .await
            .map_err(|e| McpError::invalid_params(format!("{}: {e}", e.code()), None))?;
        json_result(&response)
    }

    #[tool(
        description = "Find up to max_paths simple paths of at most max_depth hops between two entities, with flat details for every node and edge that appears in any returned path."
    )]
    async fn find_paths(&self, Parameters(req): Parameters<FindPathsRequest>) -> Result<CallToolResult, McpError> {
        let response = graphwalk_core::find_paths(
            self.store.as_ref(),
            &req.from_uuid,
            &req.to_uuid,
            req.max_depth.unwrap_or(5),
            req.max_paths.unwrap_or(10),
        )
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        json_result(&response)
    }

    #[tool(
        description = "Build a bounded subgraph around a set of seed entities: every Entity node reachable within max_hop hops, the edges among them, an adjacency list, and optionally short paths between pairs of seeds."
    )]
    async fn subgraph(&self, Parameters(req): Parameters<SubgraphRequest>) -> Result<CallToolResult, McpError> {
        let response = graphwalk_core::build_subgraph(
            self.store.as_ref(),
            &req.entity_uuids,
            req.include_paths.unwrap_or(true),
            req.max_hop.unwrap_or(1),
        )
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        json_result(&response)
    }

    #[tool(description = "List every fact (edge) incident to a single entity, flattened for direct display.")]
    async fn relations(&self, Parameters(req): Parameters<RelationsRequest>) -> Result<CallToolResult, McpError> {
        let response = graphwalk_core::get_entity_relations(self.store.as_ref(), &req.entity_uuid)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        json_result(&response)
    }
}

#[tool_handler]
impl ServerHandler for GraphwalkServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.instructions = Some(
            "Four tools over a bounded knowledge graph: `traverse` for cursor-paginated \
             breadth-first exploration from a root entity, `find_paths` for bounded path \
             enumeration between two entities, `subgraph` for a neighborhood around a set \
             of seed entities, and `relations` for the flat fact list incident to one \
             entity. `traverse` pages are bounded by a per-call token budget, not a fixed \
             edge count — always check `cursor.has_more` before assuming a traversal is \
             complete."
                .into(),
        );
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwalk_store::InMemoryGraphStore;

    fn make_server() -> GraphwalkServer {
        let nodes = vec![
            graphwalk_core::Node::new("A", "Alice", "g"),
            graphwalk_core::Node::new("B", "Bob", "g"),
        ];
        let edges = vec![graphwalk_core::Edge {
            uuid: "E1".to_string(),
            relation_type: "KNOWS".to_string(),
            fact: "Alice knows Bob".to_string(),
            source_uuid: "A".to_string(),
            target_uuid: "B".to_string(),
            episodes: vec![],
            created_at: None,
            valid_at: None,
            invalid_at: None,
        }];
        let store = Arc::new(InMemoryGraphStore::from_nodes_and_edges(nodes, edges));
        GraphwalkServer::new(store, b"test-secret".to_vec())
    }

    #[tokio::test]
    async fn traverse_tool_returns_success_result() {
        let server = make_server();
        let result = server
            .traverse(Parameters(TraverseRequest {
                start_node_uuid: Some("A".to_string()),
                depth: Some(1),
                cursor: None,
            }))
            .await
            .unwrap();
        assert!(!result.content.is_empty());
    }

    #[tokio::test]
    async fn traverse_tool_rejects_missing_start_and_cursor() {
        let server = make_server();
        let err = server
            .traverse(Parameters(TraverseRequest {
                start_node_uuid: None,
                depth: None,
                cursor: None,
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("INVALID_ARGUMENT"));
    }

    #[tokio::test]
    async fn relations_tool_lists_incident_facts() {
        let server = make_server();
        let result = server
            .relations(Parameters(RelationsRequest {
                entity_uuid: "A".to_string(),
            }))
            .await
            .unwrap();
        assert!(!result.content.is_empty());
    }
}
