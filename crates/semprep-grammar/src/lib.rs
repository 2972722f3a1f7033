//! Semprep grammar data model (per-instance action spaces)
//!
//! This crate defines the types shared between the corpus pipeline and the
//! world/grammar collaborators: production rules, per-instance action spaces,
//! action sequences, tokens, and the knowledge-graph table representation.
//!
//! The grammar itself lives behind the [`world::World`] trait: each instance
//! gets its own world, and therefore its own rule enumeration and its own
//! index assignment. Indices are never comparable across instances.

pub mod graph;
pub mod rule;
pub mod token;
pub mod world;

pub use graph::KnowledgeGraph;
pub use rule::{ActionSequence, ActionSpace, ProductionRule};
pub use token::{Token, Tokenizer, WordTokenizer};
pub use world::{EntityExtractionParams, TableContext, World, WorldBuilder, WorldError};
