//! Token-denominated response size budgeting (C1).
//!
//! Byte-based heuristics underestimate CJK and overestimate ASCII; a real
//! tokenizer is preferred, with a `len/4` fallback only when none is wired
//! up. The tokenizer is a replaceable collaborator behind [`TokenEstimator`].

use serde::Serialize;
use serde_json::Value;

/// Default response token ceiling (spec.md §6 `MAX_TOKENS_PER_RESPONSE`).
pub const MAX_RESPONSE_TOKENS: usize = 20_000;

/// A pluggable token estimator for a JSON-serializable value.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, value: &Value) -> usize;
}

/// Fallback estimator: `max(1, ceil(len(serialized_json) / 4))`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, value: &Value) -> usize {
        let serialized = serde_json::to_string(value).unwrap_or_default();
        heuristic_len(&serialized)
    }
}

fn heuristic_len(serialized: &str) -> usize {
    let len = serialized.len();
    std::cmp::max(1, len.div_ceil(4))
}

/// Real tokenizer backed by `tiktoken-rs`'s `cl100k_base` encoding, the
/// encoding used by the GPT-3.5/4 model family.
#[cfg(feature = "tiktoken")]
pub struct Cl100kEstimator {
    encoder: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl Cl100kEstimator {
    pub fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            encoder: tiktoken_rs::cl100k_base()?,
        })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenEstimator for Cl100kEstimator {
    fn estimate(&self, value: &Value) -> usize {
        let serialized = serde_json::to_string(value).unwrap_or_default();
        let count = self.encoder.encode_with_special_tokens(&serialized).len();
        std::cmp::max(1, count)
    }
}

/// Manages token budget for response size control.
pub struct TokenBudget {
    limit: usize,
    used: usize,
    estimator: Box<dyn TokenEstimator>,
}

impl std::fmt::Debug for TokenBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudget")
            .field("limit", &self.limit)
            .field("used", &self.used)
            .finish()
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::new(MAX_RESPONSE_TOKENS)
    }
}

impl TokenBudget {
    pub fn new(limit: usize) -> Self {
        Self::with_estimator(limit, Box::new(HeuristicEstimator))
    }

    pub fn with_estimator(limit: usize, estimator: Box<dyn TokenEstimator>) -> Self {
        Self {
            limit,
            used: 0,
            estimator,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Deterministic token count of any JSON-serializable value.
    pub fn estimate<T: Serialize>(&self, value: &T) -> usize {
        let json = serde_json::to_value(value).unwrap_or(Value::Null);
        self.estimator.estimate(&json)
    }

    /// Would the current running total plus `value`'s estimate fit?
    pub fn can_add<T: Serialize>(&self, value: &T) -> bool {
        self.used + self.estimate(value) <= self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn add<T: Serialize>(&mut self, value: &T) {
        self.used += self.estimate(value);
    }

    /// Would appending `edge` to `page.edges` (and any newly referenced
    /// target node in `page.nodes`) keep the total estimate within `limit`?
    /// This mirrors `can_add_edge` in the original's token_budget module:
    /// it re-estimates the *whole* tentative page, not an incremental delta,
    /// because token counts are not additive across JSON structural
    /// boundaries (commas, braces).
    pub fn can_add_edge<T: Serialize>(&self, tentative_page: &T) -> bool {
        self.estimate(tentative_page) <= self.limit
    }
}
