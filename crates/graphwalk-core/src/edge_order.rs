//! Deterministic, total ordering over edges incident to a focus node (C2).
//!
//! Resumption from `Frame::next_edge_index` is only correct if this sort is
//! stable across calls; the store's physical return order is not a
//! contract. The orderer is a pure function of the edge list, the focus
//! node, and the mode.

use crate::model::Edge;
use serde::{Deserialize, Serialize};

/// Recognized edge ordering modes (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrdering {
    Uuid,
    TypeThenUuid,
    CreatedAtThenUuid,
}

impl Default for EdgeOrdering {
    fn default() -> Self {
        Self::Uuid
    }
}

impl EdgeOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::TypeThenUuid => "type_then_uuid",
            Self::CreatedAtThenUuid => "created_at_then_uuid",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "uuid" => Some(Self::Uuid),
            "type_then_uuid" => Some(Self::TypeThenUuid),
            "created_at_then_uuid" => Some(Self::CreatedAtThenUuid),
            _ => None,
        }
    }
}

/// Sort `edges` (all incident to `focus_uuid`) into the total order named
/// by `mode`. Any remaining ambiguity after the mode's declared keys breaks
/// by edge UUID ascending.
pub fn order_edges(edges: &mut [Edge], focus_uuid: &str, mode: EdgeOrdering) {
    match mode {
        EdgeOrdering::Uuid => edges.sort_by(|a, b| {
            (a.relation_type.as_str(), a.other_endpoint(focus_uuid), a.uuid.as_str()).cmp(&(
                b.relation_type.as_str(),
                b.other_endpoint(focus_uuid),
                b.uuid.as_str(),
            ))
        }),
        EdgeOrdering::TypeThenUuid => edges.sort_by(|a, b| {
            let key_a = (
                a.relation_type.as_str(),
                a.created_at,
                a.other_endpoint(focus_uuid),
                a.uuid.as_str(),
            );
            let key_b = (
                b.relation_type.as_str(),
                b.created_at,
                b.other_endpoint(focus_uuid),
                b.uuid.as_str(),
            );
            key_a.cmp(&key_b)
        }),
        EdgeOrdering::CreatedAtThenUuid => edges.sort_by(|a, b| {
            // nulls last: None sorts after Some(_) under a reversed Option
            // ordering, so we map to a tuple that puts `None` last.
            let key_a = (
                a.created_at.is_none(),
                a.created_at,
                a.relation_type.as_str(),
                a.other_endpoint(focus_uuid),
                a.uuid.as_str(),
            );
            let key_b = (
                b.created_at.is_none(),
                b.created_at,
                b.relation_type.as_str(),
                b.other_endpoint(focus_uuid),
                b.uuid.as_str(),
            );
            key_a.cmp(&key_b)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn edge(uuid: &str, relation: &str, source: &str, target: &str, created_at: Option<DateTime<Utc>>) -> Edge {
        Edge {
            uuid: uuid.to_string(),
            relation_type: relation.to_string(),
            fact: String::new(),
            source_uuid: source.to_string(),
            target_uuid: target.to_string(),
            episodes: vec![],
            created_at,
            valid_at: None,
            invalid_at: None,
        }
    }

    #[test]
    fn uuid_mode_orders_by_type_then_other_endpoint() {
        let mut edges = vec![
            edge("E3", "B", "A", "X", None),
            edge("E1", "A", "A", "Z", None),
            edge("E2", "A", "A", "Y", None),
        ];
        order_edges(&mut edges, "A", EdgeOrdering::Uuid);
        let ids: Vec<&str> = edges.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids, vec!["E2", "E1", "E3"]);
    }

    #[test]
    fn ties_broken_by_edge_uuid_ascending() {
        let mut edges = vec![
            edge("E2", "A", "A", "Z", None),
            edge("E1", "A", "A", "Z", None),
        ];
        order_edges(&mut edges, "A", EdgeOrdering::Uuid);
        let ids: Vec<&str> = edges.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E2"]);
    }

    #[test]
    fn created_at_then_uuid_puts_nulls_last() {
        let t1 = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut edges = vec![
            edge("E1", "A", "A", "Z", None),
            edge("E2", "A", "A", "Y", Some(t1)),
        ];
        order_edges(&mut edges, "A", EdgeOrdering::CreatedAtThenUuid);
        let ids: Vec<&str> = edges.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids, vec!["E2", "E1"]);
    }

    #[test]
    fn ordering_is_stable_across_shuffled_input() {
        let forward = vec![
            edge("E1", "A", "A", "Z", None),
            edge("E2", "B", "A", "Y", None),
            edge("E3", "C", "A", "X", None),
        ];
        let mut shuffled = vec![forward[2].clone(), forward[0].clone(), forward[1].clone()];
        let mut original = forward.clone();
        order_edges(&mut original, "A", EdgeOrdering::Uuid);
        order_edges(&mut shuffled, "A", EdgeOrdering::Uuid);
        let ids_a: Vec<&str> = original.iter().map(|e| e.uuid.as_str()).collect();
        let ids_b: Vec<&str> = shuffled.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn parse_round_trips_as_str() {
        for mode in [
            EdgeOrdering::Uuid,
            EdgeOrdering::TypeThenUuid,
            EdgeOrdering::CreatedAtThenUuid,
        ] {
            assert_eq!(EdgeOrdering::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(EdgeOrdering::parse("bogus"), None);
    }
}
