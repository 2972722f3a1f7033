//! Instance assembly: one training example per surviving QA pair.

use semprep_grammar::{
    ActionSequence, ActionSpace, KnowledgeGraph, TableContext, Token, Tokenizer, World,
    WordTokenizer, WorldBuilder,
};
use std::collections::HashSet;
use std::path::Path;

use crate::corpus::{CorpusItem, CorpusIter, CorpusLoader, ReadStats};
use crate::linearize::linearize_candidates;
use crate::{ReadError, ReaderOptions, TokenIndexerConfig};

/// Table/knowledge representation attached to an instance, with the
/// token-indexing knobs already applied.
#[derive(Debug, Clone)]
pub struct TableRepr {
    pub graph: KnowledgeGraph,
    pub indexer: TokenIndexerConfig,
    /// Whether these tokens contribute to vocabulary construction.
    pub include_in_vocab: bool,
}

impl TableRepr {
    fn new(
        graph: KnowledgeGraph,
        indexer: TokenIndexerConfig,
        include_in_vocab: bool,
        max_tokens: Option<usize>,
    ) -> Self {
        let graph = match max_tokens {
            Some(cap) => cap_table_tokens(graph, cap),
            None => graph,
        };
        TableRepr {
            graph,
            indexer,
            include_in_vocab,
        }
    }
}

/// Truncate entity texts so the total whitespace token count stays within
/// `cap`. Entities in enumeration order get first claim on the budget;
/// texts keyed outside the entity list are capped after them.
fn cap_table_tokens(mut graph: KnowledgeGraph, cap: usize) -> KnowledgeGraph {
    let mut budget = cap;
    let mut shrink = |text: &mut String| {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() <= budget {
            budget -= tokens.len();
        } else {
            *text = tokens[..budget].join(" ");
            budget = 0;
        }
    };
    for entity in &graph.entities {
        if let Some(text) = graph.entity_text.get_mut(entity) {
            shrink(text);
        }
    }
    let listed: HashSet<&str> = graph.entities.iter().map(String::as_str).collect();
    for (entity, text) in graph.entity_text.iter_mut() {
        if !listed.contains(entity.as_str()) {
            shrink(text);
        }
    }
    graph
}

/// One fully assembled training example.
///
/// Immutable after construction. `candidate_sequences` and `agenda` are
/// `None` when not configured/requested for this read; an instance whose
/// requested supervision produced zero valid sequences is never built at
/// all (the builder returns `None` instead).
#[derive(Debug)]
pub struct Instance<W> {
    pub question: Vec<Token>,
    pub question_indexer: TokenIndexerConfig,
    pub table: TableRepr,
    pub world: W,
    pub action_space: ActionSpace,
    pub candidate_sequences: Option<Vec<ActionSequence>>,
    /// Heuristic agenda indices; `[-1]` sentinel when the agenda is empty,
    /// so the field stays non-empty and uniformly shaped for batching.
    pub agenda: Option<Vec<i64>>,
    /// Opaque answer payload from the dataset file.
    pub target_answer: serde_json::Value,
}

/// Map agenda rule strings to indices in the instance's action space.
///
/// Unlike candidate linearization, a miss here is a hard error: agenda
/// rules come from the same world that produced the action space, so a
/// missing one means the collaborator contradicts itself.
pub fn build_agenda<W: World>(world: &W, space: &ActionSpace) -> Result<Vec<i64>, ReadError> {
    let agenda = world.get_agenda();
    if agenda.is_empty() {
        return Ok(vec![-1]);
    }
    agenda
        .into_iter()
        .map(|rule| match space.index_of(&rule) {
            Some(index) => Ok(index as i64),
            None => Err(ReadError::AgendaRuleMissing { rule }),
        })
        .collect()
}

/// Converts corpus items into [`Instance`]s using a world-builder
/// collaborator.
pub struct DatasetReader<B: WorldBuilder> {
    options: ReaderOptions,
    builder: B,
    tokenizer: Box<dyn Tokenizer>,
}

impl<B: WorldBuilder> DatasetReader<B> {
    pub fn new(options: ReaderOptions, builder: B) -> Self {
        DatasetReader {
            options,
            builder,
            tokenizer: Box::new(WordTokenizer),
        }
    }

    /// Substitute the tokenizer collaborator.
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Stream instances from a dataset file.
    pub fn read(&self, dataset_path: &Path) -> Result<InstanceIter<'_, B>, ReadError> {
        let corpus = CorpusLoader::new(self.options.clone()).read(dataset_path)?;
        Ok(InstanceIter {
            reader: self,
            corpus,
            kept: 0,
            finished: false,
        })
    }

    /// Build one instance from a corpus item.
    ///
    /// Returns `Ok(None)` exactly when candidate logical forms were present
    /// but none survived validation; every other path yields an instance.
    pub fn build_instance(
        &self,
        item: &CorpusItem,
    ) -> Result<Option<Instance<B::World>>, ReadError> {
        let question = self.tokenizer.tokenize(&item.question.to_lowercase());
        let context = self.builder.build_context(
            &item.table_lines,
            &question,
            &self.options.entity_extraction,
        )?;
        let world = self.builder.build_world(&context)?;
        let action_space = ActionSpace::build(&world);

        let candidate_sequences = match &item.logical_forms {
            Some(forms) if !forms.is_empty() => {
                let accepted = linearize_candidates(
                    &world,
                    &action_space,
                    forms,
                    self.options.max_logical_forms,
                    &item.question,
                )?;
                if accepted.is_empty() {
                    tracing::debug!(
                        query_id = %item.query_id,
                        "no candidate logical form survived validation, dropping instance"
                    );
                    return Ok(None);
                }
                Some(accepted)
            }
            // An absent (or empty) candidate list means supervision was not
            // requested for this instance, not that zero candidates were
            // valid.
            _ => None,
        };

        let agenda = if self.options.output_agendas {
            Some(build_agenda(&world, &action_space)?)
        } else {
            None
        };

        let table = TableRepr::new(
            context.knowledge_graph(),
            self.options.table_indexer().clone(),
            self.options.use_table_for_vocab,
            self.options.max_table_tokens,
        );

        Ok(Some(Instance {
            question,
            question_indexer: self.options.question_indexer.clone(),
            table,
            world,
            action_space,
            candidate_sequences,
            agenda,
            target_answer: item.answer.clone(),
        }))
    }
}

/// Pull-based instance stream over one dataset read.
pub struct InstanceIter<'a, B: WorldBuilder> {
    reader: &'a DatasetReader<B>,
    corpus: CorpusIter,
    kept: usize,
    finished: bool,
}

impl<B: WorldBuilder> InstanceIter<'_, B> {
    /// Running totals; final once the iterator is exhausted.
    pub fn stats(&self) -> ReadStats {
        ReadStats {
            instances_kept: self.kept,
            ..self.corpus.stats().clone()
        }
    }
}

impl<B: WorldBuilder> Iterator for InstanceIter<'_, B> {
    type Item = Result<Instance<B::World>, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let item = match self.corpus.next() {
                Some(Ok(item)) => item,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    tracing::info!(kept = self.kept, "kept instances");
                    return None;
                }
            };
            match self.reader.build_instance(&item) {
                Ok(Some(instance)) => {
                    self.kept += 1;
                    return Some(Ok(instance));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
