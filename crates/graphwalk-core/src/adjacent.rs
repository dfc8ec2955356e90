//! Bounded path and subgraph operations (C8): `find_paths`, `build_subgraph`,
//! `get_entity_relations`. These sit beside the paginated traversal engine
//! but are one-shot, bounded-by-construction calls rather than cursor-based
//! (spec.md §5): a caller picks `max_depth`/`max_paths`/`max_hop` up front
//! and gets one response back.

use crate::format::{format_edge, format_node, FlatEdge, NodeRecord};
use crate::model::Edge;
use crate::store::{GraphStore, StoreError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdjacentError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PathResult {
    pub path_id: usize,
    pub length: usize,
    pub node_sequence: Vec<String>,
    pub edge_sequence: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathSearchMetadata {
    pub from_uuid: String,
    pub to_uuid: String,
    pub max_depth: u32,
    pub max_paths: usize,
    pub total_paths_found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathSearchResponse {
    pub message: String,
    pub paths: Vec<PathResult>,
    pub node_details: HashMap<String, NodeRecord>,
    pub edge_details: HashMap<String, FlatEdge>,
    pub metadata: PathSearchMetadata,
}

/// Find up to `max_paths` paths of at most `max_depth` hops between
/// `from_uuid` and `to_uuid`, plus flat details for every node/edge that
/// appears in any returned path.
pub async fn find_paths(
    store: &dyn GraphStore,
    from_uuid: &str,
    to_uuid: &str,
    max_depth: u32,
    max_paths: usize,
) -> Result<PathSearchResponse, AdjacentError> {
    let mut records = store.find_paths(from_uuid, to_uuid, max_depth, max_paths).await?;
    // The store's own ordering is unspecified; shortest-first is part of
    // this operation's contract, so enforce it here regardless of backend.
    records.sort_by_key(|r| r.hop_count());

    let mut all_node_uuids: HashSet<String> = HashSet::new();
    let mut all_edge_uuids: HashSet<String> = HashSet::new();
    let mut paths = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        all_node_uuids.extend(record.node_uuids.iter().cloned());
        all_edge_uuids.extend(record.edge_uuids.iter().cloned());
        paths.push(PathResult {
            path_id: i + 1,
            length: record.hop_count(),
            node_sequence: record.node_uuids.clone(),
            edge_sequence: record.edge_uuids.clone(),
        });
    }

    let mut node_details = HashMap::new();
    for uuid in &all_node_uuids {
        if let Some(node) = store.get_node(uuid).await? {
            node_details.insert(uuid.clone(), format_node(&node));
        }
    }

    let mut edge_details = HashMap::new();
    if !all_edge_uuids.is_empty() {
        let mut seen_source_nodes: HashSet<String> = HashSet::new();
        for node_uuid in &all_node_uuids {
            if !seen_source_nodes.insert(node_uuid.clone()) {
                continue;
            }
            for edge in store.edges_incident(node_uuid).await? {
                if all_edge_uuids.contains(&edge.uuid) && !edge_details.contains_key(&edge.uuid) {
                    edge_details.insert(edge.uuid.clone(), format_edge(&edge, 0, 0));
                }
            }
        }
    }

    let message = if paths.is_empty() {
        "No paths found between the specified entities".to_string()
    } else {
        format!("Found {} path(s) between entities", paths.len())
    };

    let total_paths_found = paths.len();
    Ok(PathSearchResponse {
        message,
        paths,
        node_details,
        edge_details,
        metadata: PathSearchMetadata {
            from_uuid: from_uuid.to_string(),
            to_uuid: to_uuid.to_string(),
            max_depth,
            max_paths,
            total_paths_found,
        },
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubgraphData {
    pub nodes: HashMap<String, NodeRecord>,
    pub edges: Vec<FlatEdge>,
    pub adjacency_list: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphMetadata {
    pub entity_uuids: Vec<String>,
    pub max_hop: u32,
    pub include_paths: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphResponse {
    pub message: String,
    pub subgraph: SubgraphData,
    pub statistics: SubgraphStatistics,
    pub paths_between_entities: BTreeMap<String, Vec<PathResult>>,
    pub metadata: SubgraphMetadata,
}

/// Build the bounded neighborhood subgraph around `entity_uuids`: every
/// non-Episodic node within `max_hop` of any seed, the edges among them,
/// an adjacency list, and (if `include_paths`) up to 5 paths of at most
/// `min(3, max_hop*2)` hops between every pair of seeds that both resolved
/// to a node.
pub async fn build_subgraph(
    store: &dyn GraphStore,
    entity_uuids: &[String],
    include_paths: bool,
    max_hop: u32,
) -> Result<SubgraphResponse, AdjacentError> {
    if entity_uuids.is_empty() {
        return Ok(SubgraphResponse {
            message: "Empty entity list provided".to_string(),
            subgraph: SubgraphData::default(),
            statistics: SubgraphStatistics {
                node_count: 0,
                edge_count: 0,
            },
            paths_between_entities: BTreeMap::new(),
            metadata: SubgraphMetadata {
                entity_uuids: vec![],
                max_hop,
                include_paths,
            },
        });
    }

    let mut nodes: HashMap<String, NodeRecord> = HashMap::new();
    let mut adjacency_list: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut edges: Vec<FlatEdge> = Vec::new();
    let mut seen_edge_uuids: HashSet<String> = HashSet::new();

    let (neighborhood_nodes, neighborhood_edges) = store.neighborhood(entity_uuids, max_hop).await?;
    for node in &neighborhood_nodes {
        nodes.entry(node.uuid.clone()).or_insert_with(|| format_node(node));
        adjacency_list.entry(node.uuid.clone()).or_default();
    }
    for edge in &neighborhood_edges {
        record_subgraph_edge(edge, &mut edges, &mut adjacency_list, &mut seen_edge_uuids);
    }

    let mut paths_between_entities = BTreeMap::new();
    if include_paths && entity_uuids.len() > 1 {
        let path_depth = std::cmp::min(3, max_hop * 2);
        for i in 0..entity_uuids.len() {
            for j in (i + 1)..entity_uuids.len() {
                let uuid1 = &entity_uuids[i];
                let uuid2 = &entity_uuids[j];
                if nodes.contains_key(uuid1) && nodes.contains_key(uuid2) {
                    let result = find_paths(store, uuid1, uuid2, path_depth, 5).await?;
                    let key = format!("{uuid1}_to_{uuid2}");
                    paths_between_entities.insert(key, result.paths);
                }
            }
        }
    }

    let node_count = nodes.len();
    let edge_count = edges.len();
    Ok(SubgraphResponse {
        message: format!("Subgraph built with {node_count} nodes and {edge_count} edges"),
        subgraph: SubgraphData {
            nodes,
            edges,
            adjacency_list,
        },
        statistics: SubgraphStatistics { node_count, edge_count },
        paths_between_entities,
        metadata: SubgraphMetadata {
            entity_uuids: entity_uuids.to_vec(),
            max_hop,
            include_paths,
        },
    })
}

fn record_subgraph_edge(
    edge: &Edge,
    edges: &mut Vec<FlatEdge>,
    adjacency_list: &mut BTreeMap<String, Vec<String>>,
    seen_edge_uuids: &mut HashSet<String>,
) {
    if !seen_edge_uuids.insert(edge.uuid.clone()) {
        return;
    }
    edges.push(format_edge(edge, 0, 0));

    if let Some(neighbors) = adjacency_list.get_mut(&edge.source_uuid) {
        if !neighbors.contains(&edge.target_uuid) {
            neighbors.push(edge.target_uuid.clone());
        }
    }
    if let Some(neighbors) = adjacency_list.get_mut(&edge.target_uuid) {
        if !neighbors.contains(&edge.source_uuid) {
            neighbors.push(edge.source_uuid.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FactResult {
    pub uuid: String,
    pub name: String,
    pub fact: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub valid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub invalid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub source_uuid: String,
    pub target_uuid: String,
    pub episodes: Vec<String>,
}

fn format_fact_result(edge: &Edge) -> FactResult {
    FactResult {
        uuid: edge.uuid.clone(),
        name: edge.relation_type.clone(),
        fact: edge.fact.clone(),
        created_at: edge.created_at,
        valid_at: edge.valid_at,
        invalid_at: edge.invalid_at,
        source_uuid: edge.source_uuid.clone(),
        target_uuid: edge.target_uuid.clone(),
        episodes: edge.episodes.clone(),
    }
}

/// All relationships incident to `entity_uuid`, formatted as facts.
pub async fn get_entity_relations(store: &dyn GraphStore, entity_uuid: &str) -> Result<Vec<FactResult>, AdjacentError> {
    let edges = store.edges_incident(entity_uuid).await?;
    Ok(edges.iter().map(format_fact_result).collect())
}
