//! Process-wide configuration, loaded from environment variables with the
//! typed defaults SPEC_FULL.md §6 names as normative constants.

use graphwalk_core::{MAX_DEPTH, MAX_RESPONSE_TOKENS};

const DEFAULT_CURSOR_TTL_SECONDS: i64 = 600;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 3600;
const DEFAULT_MAX_PATHS_PER_CALL: usize = 50;
const DEFAULT_MAX_SUBGRAPH_HOP: u32 = 3;

#[derive(Debug, Clone)]
pub struct GraphwalkConfig {
    pub max_depth: u32,
    pub max_tokens_per_response: usize,
    pub cursor_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub max_paths_per_call: usize,
    pub max_subgraph_hop: u32,
    pub cursor_secret: Vec<u8>,
}

impl Default for GraphwalkConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_tokens_per_response: MAX_RESPONSE_TOKENS,
            cursor_ttl_seconds: DEFAULT_CURSOR_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            max_paths_per_call: DEFAULT_MAX_PATHS_PER_CALL,
            max_subgraph_hop: DEFAULT_MAX_SUBGRAPH_HOP,
            cursor_secret: b"graphwalk-dev-secret-do-not-use-in-production".to_vec(),
        }
    }
}

impl GraphwalkConfig {
    /// Overlay environment variables onto the defaults. Unset or
    /// unparseable variables fall back silently to the default, matching
    /// the donor CLI's `env::var(...).ok().and_then(...).unwrap_or(...)`
    /// convention for process-tuning knobs.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_depth: env_parsed("GRAPHWALK_MAX_DEPTH").unwrap_or(defaults.max_depth),
            max_tokens_per_response: env_parsed("GRAPHWALK_MAX_TOKENS_PER_RESPONSE")
                .unwrap_or(defaults.max_tokens_per_response),
            cursor_ttl_seconds: env_parsed("GRAPHWALK_CURSOR_TTL_SECONDS").unwrap_or(defaults.cursor_ttl_seconds),
            session_ttl_seconds: env_parsed("GRAPHWALK_SESSION_TTL_SECONDS").unwrap_or(defaults.session_ttl_seconds),
            max_paths_per_call: env_parsed("GRAPHWALK_MAX_PATHS_PER_CALL").unwrap_or(defaults.max_paths_per_call),
            max_subgraph_hop: env_parsed("GRAPHWALK_MAX_SUBGRAPH_HOP").unwrap_or(defaults.max_subgraph_hop),
            cursor_secret: std::env::var("GRAPHWALK_CURSOR_SECRET")
                .map(|s| s.into_bytes())
                .unwrap_or(defaults.cursor_secret),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_named_constants() {
        let cfg = GraphwalkConfig::default();
        assert_eq!(cfg.max_depth, 5);
        assert_eq!(cfg.max_tokens_per_response, 20_000);
        assert_eq!(cfg.cursor_ttl_seconds, 600);
        assert_eq!(cfg.session_ttl_seconds, 3600);
        assert_eq!(cfg.max_paths_per_call, 50);
        assert_eq!(cfg.max_subgraph_hop, 3);
    }

    #[test]
    fn from_env_falls_back_to_default_when_unset() {
        unsafe {
            std::env::remove_var("GRAPHWALK_MAX_DEPTH");
        }
        let cfg = GraphwalkConfig::from_env();
        assert_eq!(cfg.max_depth, 5);
    }
}
