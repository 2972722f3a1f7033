//! Collaborator traits: world/grammar, table context, and their errors.
//!
//! The pipeline never defines a grammar. It consumes one instance-scoped
//! world at a time through [`World`], and builds that world from table
//! content through [`WorldBuilder`]. Concrete implementations live outside
//! this workspace (the domain grammar, entity linking, embeddings).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::graph::KnowledgeGraph;
use crate::token::Token;

/// Failure surface of a world collaborator.
///
/// `Parse` is the *only* recoverable kind: a candidate logical form that the
/// grammar cannot parse. Everything else is an internal inconsistency and
/// must abort the read rather than silently skip data.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to parse logical form: {message}")]
    Parse { message: String },

    #[error("world internal error: {message}")]
    Internal { message: String },
}

/// Instance-scoped grammar collaborator.
///
/// `all_possible_actions` must be deterministic and order-stable across calls
/// for the same instance; the action space indexer preserves that order as
/// the index assignment.
pub trait World {
    /// Parsed logical-form expression. Opaque to the pipeline.
    type Expression;

    /// Full rule listing for this instance, as `LHS -> RHS` strings.
    fn all_possible_actions(&self) -> Vec<String>;

    /// Whether `rhs` names an entity derived from this instance's table
    /// (as opposed to a fixed operator or type shared across instances).
    fn is_instance_specific_entity(&self, rhs: &str) -> bool;

    /// Parse a candidate logical form. Malformed candidates fail with
    /// [`WorldError::Parse`]; any other failure is internal.
    fn parse_logical_form(&self, text: &str) -> Result<Self::Expression, WorldError>;

    /// Top-down derivation of `expr` as an ordered list of rule strings.
    fn get_action_sequence(&self, expr: &Self::Expression) -> Vec<String>;

    /// Heuristic agenda rules for this instance. Every returned rule is
    /// expected to be a member of this instance's own action space.
    fn get_agenda(&self) -> Vec<String>;
}

/// Table/knowledge representation collaborator for one instance.
pub trait TableContext {
    /// Knowledge graph extracted from the table (entities, neighbors,
    /// entity text).
    fn knowledge_graph(&self) -> KnowledgeGraph;
}

/// Knobs forwarded into context construction for similarity-based entity
/// extraction. Loading the embedding is the collaborator's concern; the
/// pipeline only carries the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExtractionParams {
    /// Optional pretrained embedding used for similarity matching.
    pub embedding_path: Option<PathBuf>,
    /// Distance threshold below which a table token counts as an entity
    /// match for the question.
    pub distance_threshold: f64,
}

impl Default for EntityExtractionParams {
    fn default() -> Self {
        Self {
            embedding_path: None,
            distance_threshold: 0.3,
        }
    }
}

/// Factory for per-instance contexts and worlds.
pub trait WorldBuilder {
    type Context: TableContext;
    type World: World;

    /// Build the table/knowledge representation from raw tab-split table
    /// lines and the tokenized question.
    fn build_context(
        &self,
        table_lines: &[Vec<String>],
        question: &[Token],
        params: &EntityExtractionParams,
    ) -> Result<Self::Context, WorldError>;

    /// Build the grammar world over a constructed context.
    fn build_world(&self, context: &Self::Context) -> Result<Self::World, WorldError>;
}
