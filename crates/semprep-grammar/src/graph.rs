//! Knowledge-graph table representation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entity/neighbor view of one instance's table, as surfaced by the table
/// context collaborator.
///
/// Entities are collaborator-defined strings (cell values, column headers,
/// extracted numbers); `neighbors` is the adjacency over those entities and
/// `entity_text` maps each entity to the surface text used for similarity
/// features. Maps are ordered so serialized instances are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeGraph {
    pub entities: Vec<String>,
    pub neighbors: BTreeMap<String, Vec<String>>,
    pub entity_text: BTreeMap<String, String>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Total token count across all entity texts, whitespace-split. Used to
    /// enforce the table-token retention cap.
    pub fn text_token_count(&self) -> usize {
        self.entity_text
            .values()
            .map(|t| t.split_whitespace().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_count_sums_across_entities() {
        let mut graph = KnowledgeGraph::default();
        graph.entities.push("string:yard_line".to_string());
        graph
            .entity_text
            .insert("string:yard_line".to_string(), "yard line".to_string());
        graph
            .entity_text
            .insert("number:40".to_string(), "40".to_string());

        assert_eq!(graph.text_token_count(), 3);
    }
}
