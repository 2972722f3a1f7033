//! Semprep reader: raw question/table/answer records to training instances.
//!
//! The pipeline turns a JSON dataset (passage id → QA pairs), a directory of
//! tagged table artifacts, and an optional directory of gzip-compressed
//! candidate logical forms into a lazy stream of [`Instance`]s for a
//! grammar-constrained semantic parser.
//!
//! Failure policy, smallest scope first:
//! - one candidate logical form that fails to parse or references a rule
//!   outside its instance's action space is skipped (logged, counted via the
//!   linearizer outcome);
//! - one QA pair whose candidate file is missing is skipped (or kept without
//!   supervision, per [`ReaderOptions::keep_if_no_logical_forms`]);
//! - one passage whose table artifact is missing is skipped entirely;
//! - anything else (dataset I/O, malformed JSON, an agenda rule missing from
//!   its own world's action space, a world internal failure) aborts the read.

pub mod archive;
pub mod corpus;
pub mod instance;
pub mod linearize;

use semprep_grammar::{EntityExtractionParams, WorldError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use corpus::{CorpusItem, CorpusIter, CorpusLoader, QaPair, ReadStats};
pub use instance::{DatasetReader, Instance, InstanceIter, TableRepr};
pub use linearize::{linearize_candidates, CandidateOutcome};

/// Default cap on accepted candidate logical forms per instance.
pub const DEFAULT_MAX_LOGICAL_FORMS: usize = 100;

/// Run-aborting reader failures.
///
/// Item-scoped problems (missing artifacts, rejected candidates) never show
/// up here; they are absorbed as skips and counted in [`ReadStats`].
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read dataset {path}")]
    Dataset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset {path}")]
    DatasetJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[error("failed to extract archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// The world's agenda referenced a rule absent from the world's own
    /// action space. That is an internal inconsistency in the collaborator,
    /// not a data problem, so it fails the run.
    #[error("agenda rule missing from action space: {rule}")]
    AgendaRuleMissing { rule: String },

    #[error(transparent)]
    World(#[from] WorldError),
}

/// How a token field is indexed downstream. Carried opaquely on instances;
/// the reader only threads it through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenIndexerConfig {
    pub namespace: String,
    pub lowercase: bool,
}

impl Default for TokenIndexerConfig {
    fn default() -> Self {
        Self {
            namespace: "tokens".to_string(),
            lowercase: true,
        }
    }
}

/// Reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Directory holding one `<passage_id>.tagged` artifact per passage.
    pub tables_directory: PathBuf,
    /// Directory holding one `<query_id>.gz` candidate-logical-forms
    /// artifact per query. Supervision is off when absent.
    pub logical_forms_directory: Option<PathBuf>,
    /// First-valid-N cap on accepted candidates per instance.
    pub max_logical_forms: usize,
    /// Keep a QA pair whose candidate artifact is missing, emitting the
    /// instance without supervision instead of skipping it.
    pub keep_if_no_logical_forms: bool,
    /// Emit heuristic agenda indices on each instance.
    pub output_agendas: bool,
    /// Indexing config for question tokens.
    pub question_indexer: TokenIndexerConfig,
    /// Indexing config for table tokens; defaults to sharing the question's.
    pub table_indexer: Option<TokenIndexerConfig>,
    /// Whether table tokens contribute to vocabulary construction.
    pub use_table_for_vocab: bool,
    /// Cap on table tokens retained in the instance's table representation.
    pub max_table_tokens: Option<usize>,
    /// Embedding path + distance threshold forwarded to context construction.
    pub entity_extraction: EntityExtractionParams,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            tables_directory: PathBuf::new(),
            logical_forms_directory: None,
            max_logical_forms: DEFAULT_MAX_LOGICAL_FORMS,
            keep_if_no_logical_forms: false,
            output_agendas: false,
            question_indexer: TokenIndexerConfig::default(),
            table_indexer: None,
            use_table_for_vocab: false,
            max_table_tokens: None,
            entity_extraction: EntityExtractionParams::default(),
        }
    }
}

impl ReaderOptions {
    pub fn new(tables_directory: impl Into<PathBuf>) -> Self {
        Self {
            tables_directory: tables_directory.into(),
            ..Self::default()
        }
    }

    /// Effective table-token indexing config.
    pub fn table_indexer(&self) -> &TokenIndexerConfig {
        self.table_indexer.as_ref().unwrap_or(&self.question_indexer)
    }
}
