//! Core engine for paginated, cursor-resumable breadth-first exploration of
//! an externally owned graph store, plus the bounded one-shot path and
//! subgraph operations that sit beside it.
//!
//! This crate has no opinion on how the graph is stored, transported, or
//! served; it owns the traversal algorithm, the session/cursor machinery
//! that makes it resumable, and the flat wire projection every operation
//! returns. [`store::GraphStore`] is the seam a real backend implements.

pub mod adjacent;
pub mod cursor;
pub mod edge_order;
pub mod engine;
pub mod format;
pub mod model;
pub mod session;
pub mod session_store;
pub mod store;
pub mod token_budget;
pub mod wrapper;

pub use adjacent::{build_subgraph, find_paths, get_entity_relations, AdjacentError};
pub use cursor::{CursorCodec, CursorError, CursorPayload};
pub use edge_order::{order_edges, EdgeOrdering};
pub use engine::{advance, EngineError, PageResult};
pub use format::{format_edge, format_node, FlatEdge, FlatNode, NodeRecord};
pub use model::{Edge, Node, NodeKind};
pub use session::{query_hash, Frame, Strategy, TraverseSession};
pub use session_store::SessionStore;
pub use store::{GraphStore, PathRecord, StoreError};
pub use token_budget::{TokenBudget, TokenEstimator, MAX_RESPONSE_TOKENS};
pub use wrapper::{TraverseResponse, TraverseRuntime, WrapperError, MAX_DEPTH, MIN_DEPTH};
