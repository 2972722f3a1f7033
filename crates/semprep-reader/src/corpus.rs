//! Corpus loader: lazy question/table/answer/candidate tuples.
//!
//! The loader is a pull-based iterator. It parses the dataset JSON up front
//! (the per-passage map is small), then reads table and candidate artifacts
//! one item at a time, holding only the current passage's table content in
//! memory. Passage order follows the dataset file; QA order follows each
//! passage's `qa_pairs` array.

use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::rc::Rc;

use crate::{ReadError, ReaderOptions};

/// One question/answer record from the dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub query_id: String,
    /// Opaque answer payload, carried through to the instance untouched.
    pub answer: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PassageData {
    qa_pairs: Vec<QaPair>,
}

/// One surviving QA pair, paired with its passage's table content and the
/// candidate logical forms read for it (if supervision is configured and
/// the artifact exists).
#[derive(Debug, Clone)]
pub struct CorpusItem {
    pub passage_id: String,
    pub question: String,
    pub query_id: String,
    /// Tab-split lines of `<passage_id>.tagged`, shared across the
    /// passage's QA pairs.
    pub table_lines: Rc<Vec<Vec<String>>>,
    pub answer: serde_json::Value,
    /// `None` when supervision is off, or when the artifact was missing and
    /// the keep-without-supervision option let the pair through.
    pub logical_forms: Option<Vec<String>>,
}

/// Diagnostic running totals for one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub passages_seen: usize,
    pub missing_tables: usize,
    pub qa_pairs_seen: usize,
    pub missing_logical_forms: usize,
    pub instances_kept: usize,
}

/// Streams [`CorpusItem`]s from a dataset file plus artifact directories.
///
/// Artifact directories are used exactly as configured; run
/// [`crate::archive::prepare_directory`] first if they may hold bundles.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    options: ReaderOptions,
}

impl CorpusLoader {
    pub fn new(options: ReaderOptions) -> Self {
        CorpusLoader { options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Parse the dataset file and return the item stream.
    ///
    /// Only dataset-level failures (unreadable file, malformed JSON) error
    /// here; per-passage and per-query artifact problems are handled during
    /// iteration as skips and counters.
    pub fn read(&self, dataset_path: &Path) -> Result<CorpusIter, ReadError> {
        let text = fs::read_to_string(dataset_path).map_err(|source| ReadError::Dataset {
            path: dataset_path.to_path_buf(),
            source,
        })?;
        // `preserve_order` keeps the passage order of the dataset file.
        let data: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&text).map_err(|source| ReadError::DatasetJson {
                path: dataset_path.to_path_buf(),
                source,
            })?;
        let mut passages = Vec::with_capacity(data.len());
        for (passage_id, value) in data {
            let parsed: PassageData =
                serde_json::from_value(value).map_err(|source| ReadError::DatasetJson {
                    path: dataset_path.to_path_buf(),
                    source,
                })?;
            passages.push((passage_id, parsed));
        }
        Ok(CorpusIter {
            options: self.options.clone(),
            passages: passages.into_iter(),
            current: None,
            stats: ReadStats::default(),
            finished: false,
        })
    }
}

struct CurrentPassage {
    passage_id: String,
    table_lines: Rc<Vec<Vec<String>>>,
    qa_pairs: std::vec::IntoIter<QaPair>,
}

/// Pull-based corpus stream. Holds at most one passage's table content.
pub struct CorpusIter {
    options: ReaderOptions,
    passages: std::vec::IntoIter<(String, PassageData)>,
    current: Option<CurrentPassage>,
    stats: ReadStats,
    finished: bool,
}

impl CorpusIter {
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    fn next_item(&mut self) -> Option<Result<CorpusItem, ReadError>> {
        loop {
            if let Some(current) = &mut self.current {
                let Some(qa) = current.qa_pairs.next() else {
                    self.current = None;
                    continue;
                };
                self.stats.qa_pairs_seen += 1;

                let logical_forms = match &self.options.logical_forms_directory {
                    Some(dir) => {
                        let path = dir.join(format!("{}.gz", qa.query_id));
                        match read_logical_forms(&path) {
                            Ok(Some(forms)) => Some(forms),
                            Ok(None) => {
                                self.stats.missing_logical_forms += 1;
                                tracing::debug!(
                                    query_id = %qa.query_id,
                                    "missing search output for instance"
                                );
                                if !self.options.keep_if_no_logical_forms {
                                    continue;
                                }
                                None
                            }
                            Err(e) => {
                                self.finished = true;
                                return Some(Err(e));
                            }
                        }
                    }
                    None => None,
                };

                return Some(Ok(CorpusItem {
                    passage_id: current.passage_id.clone(),
                    question: qa.question,
                    query_id: qa.query_id,
                    table_lines: Rc::clone(&current.table_lines),
                    answer: qa.answer,
                    logical_forms,
                }));
            }

            let Some((passage_id, passage)) = self.passages.next() else {
                self.finished = true;
                self.log_summary();
                return None;
            };
            self.stats.passages_seen += 1;

            let table_path = self
                .options
                .tables_directory
                .join(format!("{passage_id}.tagged"));
            let text = match fs::read_to_string(&table_path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.stats.missing_tables += 1;
                    tracing::info!(path = %table_path.display(), "missing table file");
                    continue;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            };
            let table_lines: Vec<Vec<String>> = text
                .lines()
                .map(|line| line.split('\t').map(str::to_string).collect())
                .collect();
            self.current = Some(CurrentPassage {
                passage_id,
                table_lines: Rc::new(table_lines),
                qa_pairs: passage.qa_pairs.into_iter(),
            });
        }
    }

    fn log_summary(&self) {
        tracing::info!(
            missing = self.stats.missing_tables,
            passages = self.stats.passages_seen,
            "missing table files"
        );
        if self.options.logical_forms_directory.is_some() {
            tracing::info!(
                missing = self.stats.missing_logical_forms,
                qa_pairs = self.stats.qa_pairs_seen,
                "missing logical-form files"
            );
        }
    }
}

impl Iterator for CorpusIter {
    type Item = Result<CorpusItem, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.next_item()
    }
}

/// Read one gzip-compressed candidate file: one logical form per line,
/// UTF-8, blank lines dropped. `Ok(None)` when the artifact is absent.
fn read_logical_forms(path: &Path) -> Result<Option<Vec<String>>, ReadError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(GzDecoder::new(file));
    let mut forms = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            forms.push(trimmed.to_string());
        }
    }
    Ok(Some(forms))
}
