//! `traverse`: the public, cursor-paginated entry point (C7).
//!
//! Orchestrates cursor verification, session load/create, one call into
//! [`engine::advance`], and response assembly. This is the only module that
//! knows about both the cursor codec and the session store at once; the
//! engine itself is oblivious to pagination tokens.

use crate::cursor::{CursorCodec, CursorError, DEFAULT_CURSOR_TTL_SECONDS};
use crate::engine::{self, EngineError, PageResult};
use crate::session::{self, TraverseSession};
use crate::session_store::SessionStore;
use crate::store::GraphStore;
use crate::token_budget::TokenBudget;
use chrono::Duration;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const MIN_DEPTH: u32 = 0;
pub const MAX_DEPTH: u32 = 5;
pub const SESSION_TTL_SECONDS: i64 = 3600;

/// Error codes mirrored 1:1 onto the wire (spec.md §4.7): each variant's
/// [`WrapperError::code`] is the stable string API consumers match on.
#[derive(Debug, Error)]
pub enum WrapperError {
    #[error("CURSOR_EXPIRED: {0}")]
    CursorExpired(String),
    #[error("INVALID_CURSOR: {0}")]
    InvalidCursor(String),
    #[error("SESSION_NOT_FOUND: {0}")]
    SessionNotFound(String),
    #[error("QUERY_MISMATCH: {0}")]
    QueryMismatch(String),
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl WrapperError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CursorExpired(_) => "CURSOR_EXPIRED",
            Self::InvalidCursor(_) => "INVALID_CURSOR",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::QueryMismatch(_) => "QUERY_MISMATCH",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Engine(_) => "STORE_ERROR",
        }
    }
}

impl From<CursorError> for WrapperError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::Expired(at) => Self::CursorExpired(format!("token expired at {at}")),
            CursorError::Invalid(msg) => Self::InvalidCursor(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CursorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub estimated_tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraverseResponse {
    pub start: String,
    #[serde(flatten)]
    pub page: PageResult,
    pub usage: Usage,
    pub cursor: CursorInfo,
}

/// Shared traversal runtime: the session store and cursor codec a process
/// holds for the lifetime of its `traverse` surface (one instance per
/// server process, cloned cheaply into request handlers).
#[derive(Clone)]
pub struct TraverseRuntime {
    sessions: SessionStore,
    cursor_codec: CursorCodec,
}

impl TraverseRuntime {
    pub fn new(cursor_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            sessions: SessionStore::new(),
            cursor_codec: CursorCodec::new(cursor_secret),
        }
    }

    /// Build a runtime over a pre-existing session store and cursor codec,
    /// e.g. to share session state across two `traverse` surfaces or to
    /// drive the store into a known state from a test harness.
    pub fn from_parts(sessions: SessionStore, cursor_codec: CursorCodec) -> Self {
        Self { sessions, cursor_codec }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn traverse(
        &self,
        store: &dyn GraphStore,
        start_node_uuid: Option<&str>,
        depth: Option<u32>,
        cursor_token: Option<&str>,
    ) -> Result<TraverseResponse, WrapperError> {
        self.traverse_with_budget(store, start_node_uuid, depth, cursor_token, TokenBudget::default())
            .await
    }

    /// Like [`Self::traverse`], but with caller-supplied token budget
    /// (e.g. a `GraphwalkConfig`-sourced limit narrower than the default).
    pub async fn traverse_with_budget(
        &self,
        store: &dyn GraphStore,
        start_node_uuid: Option<&str>,
        depth: Option<u32>,
        cursor_token: Option<&str>,
        budget: TokenBudget,
    ) -> Result<TraverseResponse, WrapperError> {
        let (session_id, mut sess, is_continuation) = match cursor_token {
            Some(token) => {
                let payload = self.cursor_codec.verify(token)?;
                let sess = self
                    .sessions
                    .load(&payload.sid)
                    .await
                    .ok_or_else(|| WrapperError::SessionNotFound("session not found or expired".to_string()))?;
                if payload.qh != sess.query_hash {
                    return Err(WrapperError::QueryMismatch(
                        "query parameters don't match original request".to_string(),
                    ));
                }
                (payload.sid, sess, true)
            }
            None => {
                let start_node_uuid = start_node_uuid
                    .ok_or_else(|| WrapperError::InvalidArgument("start_node_uuid is required for initial traversal".to_string()))?;
                let depth = depth.unwrap_or(1);
                if depth > MAX_DEPTH {
                    return Err(WrapperError::InvalidArgument(format!(
                        "depth must be between {MIN_DEPTH} and {MAX_DEPTH}"
                    )));
                }
                let session_id = Uuid::new_v4().to_string();
                let sess = TraverseSession::new(start_node_uuid, depth, Duration::seconds(SESSION_TTL_SECONDS));
                (session_id, sess, false)
            }
        };

        let (page, has_more) = engine::advance(&mut sess, store, &budget).await?;
        let estimated_tokens = budget.estimate(&page);

        let cursor = if has_more {
            self.sessions.save(session_id.clone(), sess.clone()).await;
            let (token, expires_at) =
                self.cursor_codec
                    .issue(&session_id, &sess.query_hash, Duration::seconds(DEFAULT_CURSOR_TTL_SECONDS));
            CursorInfo {
                token: Some(token),
                has_more: true,
                expires_at: Some(expires_at),
            }
        } else {
            if is_continuation {
                self.sessions.delete(&session_id).await;
            }
            CursorInfo {
                token: None,
                has_more: false,
                expires_at: None,
            }
        };

        Ok(TraverseResponse {
            start: sess.root_uuid.clone(),
            page,
            usage: Usage { estimated_tokens },
            cursor,
        })
    }
}

/// Expose [`session::query_hash`] for callers that need to precompute a
/// fingerprint without constructing a session (e.g. request validation).
pub fn query_hash(root_uuid: &str, max_depth: u32) -> String {
    session::query_hash(root_uuid, max_depth)
}
