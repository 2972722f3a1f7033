//! Shared test support: a toy world-builder collaborator.
//!
//! The grammar is deliberately tiny: a numeric start symbol, two fixed
//! operators, and one entity rule per table cell. Logical forms look like
//! `(count entity:touchdown)`. A form that fails the shape check is a parse
//! error; a form whose argument names an entity this instance's table does
//! not contain parses fine but derives a rule outside the action space.

use semprep_grammar::{
    EntityExtractionParams, KnowledgeGraph, TableContext, Token, World, WorldBuilder, WorldError,
};
use std::collections::BTreeMap;

/// Logical form that simulates a collaborator-internal failure.
pub const BOOM: &str = "!!boom";

pub struct MockContext {
    pub entities: Vec<String>,
    pub question: Vec<Token>,
}

impl TableContext for MockContext {
    fn knowledge_graph(&self) -> KnowledgeGraph {
        let mut neighbors = BTreeMap::new();
        let mut entity_text = BTreeMap::new();
        for entity in &self.entities {
            let text = entity.trim_start_matches("entity:").replace('_', " ");
            entity_text.insert(entity.clone(), text);
            neighbors.insert(entity.clone(), vec![]);
        }
        KnowledgeGraph {
            entities: self.entities.clone(),
            neighbors,
            entity_text,
        }
    }
}

#[derive(Debug)]
pub struct MockWorld {
    pub actions: Vec<String>,
    pub agenda: Vec<String>,
}

impl World for MockWorld {
    type Expression = Vec<String>;

    fn all_possible_actions(&self) -> Vec<String> {
        self.actions.clone()
    }

    fn is_instance_specific_entity(&self, rhs: &str) -> bool {
        rhs.starts_with("entity:")
    }

    fn parse_logical_form(&self, text: &str) -> Result<Vec<String>, WorldError> {
        if text == BOOM {
            return Err(WorldError::Internal {
                message: "simulated collaborator failure".to_string(),
            });
        }
        let inner = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| WorldError::Parse {
                message: format!("expected (op arg): {text}"),
            })?;
        let mut parts = inner.split_whitespace();
        let (Some(op), Some(arg), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(WorldError::Parse {
                message: format!("expected exactly two terms: {text}"),
            });
        };
        if op != "count" && op != "max" {
            return Err(WorldError::Parse {
                message: format!("unknown operator: {op}"),
            });
        }
        Ok(vec![
            "@start@ -> n".to_string(),
            format!("n -> {op}"),
            format!("n -> {arg}"),
        ])
    }

    fn get_action_sequence(&self, expr: &Vec<String>) -> Vec<String> {
        expr.clone()
    }

    fn get_agenda(&self) -> Vec<String> {
        self.agenda.clone()
    }
}

#[derive(Default)]
pub struct MockBuilder {
    /// When set, the world's agenda names a rule outside its own action
    /// space, which must hard-fail the read.
    pub inconsistent_agenda: bool,
}

impl WorldBuilder for MockBuilder {
    type Context = MockContext;
    type World = MockWorld;

    fn build_context(
        &self,
        table_lines: &[Vec<String>],
        question: &[Token],
        _params: &EntityExtractionParams,
    ) -> Result<MockContext, WorldError> {
        let mut entities = Vec::new();
        for line in table_lines {
            for cell in line {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let entity = format!("entity:{}", cell.to_lowercase().replace(' ', "_"));
                if !entities.contains(&entity) {
                    entities.push(entity);
                }
            }
        }
        Ok(MockContext {
            entities,
            question: question.to_vec(),
        })
    }

    fn build_world(&self, context: &MockContext) -> Result<MockWorld, WorldError> {
        let mut actions = vec![
            "@start@ -> n".to_string(),
            "n -> count".to_string(),
            "n -> max".to_string(),
        ];
        for entity in &context.entities {
            actions.push(format!("n -> {entity}"));
        }

        let agenda = if self.inconsistent_agenda {
            vec!["n -> @@missing@@".to_string()]
        } else {
            // Entities whose surface text shows up in the question.
            context
                .entities
                .iter()
                .filter(|entity| {
                    let text = entity.trim_start_matches("entity:").replace('_', " ");
                    text.split_whitespace()
                        .all(|w| context.question.iter().any(|t| t.text == w))
                })
                .map(|entity| format!("n -> {entity}"))
                .collect()
        };

        Ok(MockWorld { actions, agenda })
    }
}
