//! Semprep CLI
//!
//! Operational entrypoints around the reader pipeline:
//! - `prepare`: one-time, idempotent extraction of `*.tar.gz` artifact
//!   bundles, run before any reader is constructed (keeps the extraction
//!   race out of the read path);
//! - `scan`: stream the corpus loader over a dataset without a grammar
//!   world, reporting artifact coverage (missing tables / missing
//!   candidate files) before an expensive training run.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use semprep_reader::{archive, CorpusLoader, ReaderOptions};

#[derive(Parser)]
#[command(name = "semprep")]
#[command(
    author,
    version,
    about = "Semprep: corpus preparation for grammar-constrained semantic parsing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract `*.tar.gz` artifact bundles in the given directories (idempotent).
    Prepare {
        /// Artifact directories (tables and/or logical forms).
        dirs: Vec<PathBuf>,
    },

    /// Stream a dataset through the corpus loader and report coverage.
    Scan {
        /// Dataset JSON file (passage id -> qa_pairs).
        dataset: PathBuf,
        /// Directory holding `<passage_id>.tagged` table artifacts.
        #[arg(long)]
        tables: PathBuf,
        /// Directory holding `<query_id>.gz` candidate logical forms.
        #[arg(long)]
        logical_forms: Option<PathBuf>,
        /// Count QA pairs without candidates instead of skipping them.
        #[arg(long)]
        keep_if_no_logical_forms: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare { dirs } => prepare(&dirs),
        Commands::Scan {
            dataset,
            tables,
            logical_forms,
            keep_if_no_logical_forms,
        } => scan(&dataset, tables, logical_forms, keep_if_no_logical_forms),
    }
}

fn prepare(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        let resolved = archive::prepare_directory(dir)
            .with_context(|| format!("preparing {}", dir.display()))?;
        if resolved == *dir {
            println!("{} {}", "unchanged".dimmed(), dir.display());
        } else {
            println!(
                "{} {} -> {}",
                "extracted".green(),
                dir.display(),
                resolved.display()
            );
        }
    }
    Ok(())
}

fn scan(
    dataset: &PathBuf,
    tables: PathBuf,
    logical_forms: Option<PathBuf>,
    keep_if_no_logical_forms: bool,
) -> Result<()> {
    let tables = archive::prepare_directory(&tables)
        .with_context(|| format!("preparing {}", tables.display()))?;
    let logical_forms = logical_forms
        .map(|dir| {
            archive::prepare_directory(&dir)
                .with_context(|| format!("preparing {}", dir.display()))
        })
        .transpose()?;

    let supervised = logical_forms.is_some();
    let options = ReaderOptions {
        logical_forms_directory: logical_forms,
        keep_if_no_logical_forms,
        ..ReaderOptions::new(tables)
    };

    let loader = CorpusLoader::new(options);
    let mut iter = loader
        .read(dataset)
        .with_context(|| format!("reading {}", dataset.display()))?;
    let mut survivors = 0usize;
    for item in &mut iter {
        item?;
        survivors += 1;
    }
    let stats = iter.stats();

    println!("{}", "corpus scan".bold());
    println!(
        "  passages:        {} ({} missing tables)",
        stats.passages_seen,
        if stats.missing_tables > 0 {
            stats.missing_tables.to_string().red().to_string()
        } else {
            "0".green().to_string()
        }
    );
    println!("  qa pairs:        {}", stats.qa_pairs_seen);
    if supervised {
        println!(
            "  missing lf files: {}",
            if stats.missing_logical_forms > 0 {
                stats.missing_logical_forms.to_string().yellow().to_string()
            } else {
                "0".green().to_string()
            }
        );
    }
    println!("  survivors:       {}", survivors.to_string().green());
    Ok(())
}
