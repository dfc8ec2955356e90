//! Reference `GraphStore` implementation: an in-memory property graph
//! seeded from a JSON fixture file. This is the only backend the CLI ships
//! with — the real graph store is an external collaborator out of scope for
//! this workspace (see SPEC_FULL.md §1).

use async_trait::async_trait;
use graphwalk_core::{Edge, GraphStore, Node, NodeKind, PathRecord, StoreError};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use tokio::sync::RwLock;

/// On-disk shape of a fixture file: a flat list of nodes and edges. Matches
/// the wire shapes in `graphwalk_core::model` directly so fixtures can be
/// hand-written without a separate schema.
#[derive(Debug, Deserialize)]
struct FixtureFile {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Debug, Default)]
struct Graph {
    nodes: HashMap<String, Node>,
    /// Adjacency: node uuid -> edges incident to it, in insertion order.
    adjacency: HashMap<String, Vec<Edge>>,
}

impl Graph {
    fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.uuid.clone(), node);
    }

    fn insert_edge(&mut self, edge: Edge) {
        self.adjacency.entry(edge.source_uuid.clone()).or_default().push(edge.clone());
        if edge.target_uuid != edge.source_uuid {
            self.adjacency.entry(edge.target_uuid.clone()).or_default().push(edge);
        }
    }
}

/// In-memory, `RwLock`-guarded graph. Cheap to clone (an `Arc` underneath
/// would be the production shape; the CLI only ever holds one instance for
/// the lifetime of a process so a bare lock is sufficient here).
pub struct InMemoryGraphStore {
    graph: RwLock<Graph>,
}

impl InMemoryGraphStore {
    pub fn empty() -> Self {
        Self {
            graph: RwLock::new(Graph::default()),
        }
    }

    pub fn from_nodes_and_edges(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Graph::default();
        for node in nodes {
            graph.insert_node(node);
        }
        for edge in edges {
            graph.insert_edge(edge);
        }
        Self {
            graph: RwLock::new(graph),
        }
    }

    /// Load a fixture file (see `FixtureFile`) from disk.
    pub async fn load_fixture(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!("reading fixture {}: {e}", path.as_ref().display()))?;
        let fixture: FixtureFile = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing fixture {}: {e}", path.as_ref().display()))?;
        Ok(Self::from_nodes_and_edges(fixture.nodes, fixture.edges))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn get_node(&self, uuid: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.graph.read().await.nodes.get(uuid).cloned())
    }

    async fn edges_incident(&self, uuid: &str) -> Result<Vec<Edge>, StoreError> {
        Ok(self.graph.read().await.adjacency.get(uuid).cloned().unwrap_or_default())
    }

    async fn find_paths(
        &self,
        source: &str,
        target: &str,
        max_depth: u32,
        max_paths: usize,
    ) -> Result<Vec<PathRecord>, StoreError> {
        let graph = self.graph.read().await;
        if !graph.nodes.contains_key(source) || !graph.nodes.contains_key(target) {
            return Ok(vec![]);
        }

        let mut found = Vec::new();
        let mut node_path = vec![source.to_string()];
        let mut edge_path: Vec<String> = Vec::new();
        let mut visiting: HashSet<String> = HashSet::from([source.to_string()]);

        enumerate_paths(&graph, target, max_depth, &mut node_path, &mut edge_path, &mut visiting, &mut found);

        found.sort_by_key(|p| p.hop_count());
        found.truncate(max_paths);

        Ok(found)
    }

    async fn neighborhood(&self, seeds: &[String], max_hop: u32) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
        let graph = self.graph.read().await;

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        for seed in seeds {
            if visited.insert(seed.clone()) {
                queue.push_back((seed.clone(), 0));
            }
        }

        let mut nodes = Vec::new();
        let mut seen_edges = HashSet::new();
        let mut edges = Vec::new();

        while let Some((uuid, hop)) = queue.pop_front() {
            if let Some(node) = graph.nodes.get(&uuid) {
                if node.kind == NodeKind::Entity {
                    nodes.push(node.clone());
                }
            }
            if hop >= max_hop {
                continue;
            }
            for edge in graph.adjacency.get(&uuid).cloned().unwrap_or_default() {
                if seen_edges.insert(edge.uuid.clone()) {
                    edges.push(edge.clone());
                }
                let other = edge.other_endpoint(&uuid).to_string();
                if visited.insert(other.clone()) {
                    queue.push_back((other, hop + 1));
                }
            }
        }

        Ok((nodes, edges))
    }
}

/// Depth-first simple-path enumeration, bounded by `max_depth` hops.
/// `visiting` tracks the nodes on the current path to keep paths simple (no
/// repeated nodes). Deliberately not capped by `max_paths` during the
/// search itself: the caller needs every candidate up to `max_depth` so it
/// can sort shortest-first before truncating, rather than risk discovering
/// `max_paths` long paths before a single short one.
#[allow(clippy::too_many_arguments)]
fn enumerate_paths(
    graph: &Graph,
    target: &str,
    max_depth: u32,
    node_path: &mut Vec<String>,
    edge_path: &mut Vec<String>,
    visiting: &mut HashSet<String>,
    found: &mut Vec<PathRecord>,
) {
    let current = node_path.last().expect("node_path always non-empty").clone();
    if current == target && !edge_path.is_empty() {
        found.push(PathRecord {
            node_uuids: node_path.clone(),
            edge_uuids: edge_path.clone(),
        });
        return;
    }
    if edge_path.len() as u32 >= max_depth {
        return;
    }
    for edge in graph.adjacency.get(&current).cloned().unwrap_or_default() {
        let other = edge.other_endpoint(&current).to_string();
        if other == current || visiting.contains(&other) {
            continue;
        }
        node_path.push(other.clone());
        edge_path.push(edge.uuid.clone());
        visiting.insert(other.clone());

        enumerate_paths(graph, target, max_depth, node_path, edge_path, visiting, found);

        visiting.remove(&other);
        edge_path.pop();
        node_path.pop();
    }
}
