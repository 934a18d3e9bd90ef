//! cardlab evaluation runner
//!
//! Fetches the card hierarchy from the remote store, pairs chapters with
//! their source PDFs, runs the LLM judge over them, and writes the run
//! report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use evals::config::{apply_env_overrides, load_config, load_config_from, Config};
use evals::harness::{EvalRunner, RunnerOptions};
use evals::hierarchy::{self, Book, Card, Chapter, Subject, Topic};
use evals::judge::Judge;
use evals::rubric::Rubric;
use llm::LlmClient;
use pdftext::PdfExtractor;
use store::{fetch_all, RestStore};

#[derive(Parser)]
#[command(name = "cardlab-eval")]
#[command(about = "LLM-judged evaluation for generated flashcards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (overrides the default location)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the three-tier evaluation pipeline (chapter / topic / card)
    Run {
        /// Class label to select (e.g. "8")
        #[arg(long)]
        class: String,

        /// Subject name, matched case-insensitively (e.g. "arts")
        #[arg(long)]
        subject: String,

        /// Directory of chapter PDFs; filename order must match chapter order
        #[arg(long)]
        pdf_dir: PathBuf,

        /// Output file for the run report
        #[arg(short, long, default_value = "chapter_evaluations.json")]
        output: PathBuf,

        /// Cards per judge request (overrides config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Rubric override file (TOML)
        #[arg(long)]
        rubric: Option<PathBuf>,
    },

    /// Run the factual-accuracy pass against raw chapter text
    Accuracy {
        #[arg(long)]
        class: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        pdf_dir: PathBuf,

        /// Golden calibration dataset (JSON)
        #[arg(long)]
        golden: PathBuf,

        #[arg(short, long, default_value = "accuracy_evaluations.json")]
        output: PathBuf,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long)]
        rubric: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_env_overrides(&mut config);

    match cli.command {
        Commands::Run {
            class,
            subject,
            pdf_dir,
            output,
            chunk_size,
            rubric,
        } => {
            let runner_options = RunnerOptions {
                chunk_size: chunk_size_for(chunk_size, config.eval.chunk_size, 10)?,
                call_delay: call_delay(&config),
            };
            let (hierarchy, documents) =
                load_inputs(&config, &class, &subject, &pdf_dir).await?;
            let judge = build_judge(&config, &rubric)?;
            let extractor = PdfExtractor;
            let runner = EvalRunner::new(judge, &extractor, runner_options);

            let report = runner.run(&hierarchy, &documents).await;
            report.print_summary();
            if report.save(&output)? {
                info!("report saved to {}", output.display());
            } else {
                info!("no chapter produced a record; nothing written");
            }
        }

        Commands::Accuracy {
            class,
            subject,
            pdf_dir,
            golden,
            output,
            chunk_size,
            rubric,
        } => {
            let golden_dataset: serde_json::Value = serde_json::from_str(
                &fs::read_to_string(&golden)
                    .with_context(|| format!("Failed to read golden dataset: {}", golden.display()))?,
            )
            .with_context(|| format!("Invalid golden dataset: {}", golden.display()))?;

            let runner_options = RunnerOptions {
                chunk_size: chunk_size_for(chunk_size, config.eval.accuracy_chunk_size, 20)?,
                call_delay: call_delay(&config),
            };
            let (hierarchy, documents) =
                load_inputs(&config, &class, &subject, &pdf_dir).await?;
            let judge = build_judge(&config, &rubric)?;
            let extractor = PdfExtractor;
            let runner = EvalRunner::new(judge, &extractor, runner_options);

            let report = runner.run_accuracy(&hierarchy, &documents, &golden_dataset).await;
            report.print_summary();
            if report.save(&output)? {
                info!("report saved to {}", output.display());
            } else {
                info!("no card produced a record; nothing written");
            }
        }
    }

    Ok(())
}

fn call_delay(config: &Config) -> Duration {
    Duration::from_millis(config.eval.call_delay_ms.unwrap_or(1000))
}

/// Chunk size from CLI, then config, then the mode default. A zero from
/// either source is a setup error: it would only trip deep in the run,
/// after judge calls have already been paid for.
fn chunk_size_for(cli: Option<usize>, configured: Option<usize>, default: usize) -> Result<usize> {
    let size = cli.or(configured).unwrap_or(default);
    if size == 0 {
        anyhow::bail!(common::Error::Setup(
            "chunk size must be positive".to_string()
        ));
    }
    Ok(size)
}

fn build_judge(config: &Config, rubric: &Option<PathBuf>) -> Result<Judge<LlmClient>> {
    let client = LlmClient::new(config.llm.clone());
    info!(
        "judge model '{}' via provider '{}'",
        client.model(),
        client.provider()
    );
    Ok(Judge::new(client, load_rubric(rubric)?))
}

fn load_rubric(path: &Option<PathBuf>) -> Result<Rubric> {
    match path {
        Some(path) => Rubric::load(path),
        None => Ok(Rubric::default()),
    }
}

/// Fetch all five collections, resolve the hierarchy for the selected
/// subject, and list the chapter documents.
async fn load_inputs(
    config: &Config,
    class: &str,
    subject: &str,
    pdf_dir: &Path,
) -> Result<(hierarchy::Hierarchy, Vec<PathBuf>)> {
    let store = RestStore::new(&config.store)?;
    let page_size = config.store.page_size();

    info!("fetching card hierarchy from the store");
    let subjects: Vec<Subject> =
        hierarchy::typed_rows("subjects", fetch_all(&store, "subjects", page_size).await?);
    let books: Vec<Book> =
        hierarchy::typed_rows("book_title", fetch_all(&store, "book_title", page_size).await?);
    let chapters: Vec<Chapter> =
        hierarchy::typed_rows("chapters", fetch_all(&store, "chapters", page_size).await?);
    let topics: Vec<Topic> =
        hierarchy::typed_rows("topics", fetch_all(&store, "topics", page_size).await?);
    let cards: Vec<Card> =
        hierarchy::typed_rows("cards", fetch_all(&store, "cards", page_size).await?);

    let resolved = hierarchy::resolve(subjects, books, chapters, topics, cards, class, subject)?;
    info!(
        "resolved {} chapters, {} cards for class {} {}",
        resolved.chapters.len(),
        resolved.card_count(),
        resolved.subject.class_name,
        resolved.subject.subject_name
    );

    let documents = list_documents(pdf_dir)?;
    info!("found {} chapter document(s)", documents.len());

    Ok((resolved, documents))
}

/// PDFs in the directory, sorted by filename to match chapter order
fn list_documents(pdf_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(pdf_dir)
        .map_err(|e| common::Error::Setup(format!("cannot read {}: {}", pdf_dir.display(), e)))?;

    let mut documents: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    documents.sort();

    if documents.is_empty() {
        anyhow::bail!(common::Error::Setup(format!(
            "no PDF documents in {}",
            pdf_dir.display()
        )));
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_precedence() {
        assert_eq!(chunk_size_for(Some(15), Some(5), 10).unwrap(), 15);
        assert_eq!(chunk_size_for(None, Some(5), 10).unwrap(), 5);
        assert_eq!(chunk_size_for(None, None, 10).unwrap(), 10);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected_up_front() {
        let err = chunk_size_for(Some(0), None, 10).unwrap_err();
        assert!(err.to_string().contains("chunk size must be positive"));

        // A bad config value is caught the same way
        assert!(chunk_size_for(None, Some(0), 20).is_err());
    }
}
