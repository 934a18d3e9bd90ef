//! Evaluation pipeline for cardlab
//!
//! Scores machine-generated flashcards against source chapter text with
//! a remote LLM judge, at three levels:
//!
//! - **Chapter**: does the whole card set cover the chapter? (1-5)
//! - **Topic**: is the card count per topic optimal? (1-5)
//! - **Card**: correctness and relevance per card (1-5 each), judged in
//!   bounded-size chunks
//!
//! A separate accuracy pass scores each card 1-4 for how verifiable its
//! answer is against the raw chapter text.
//!
//! Partial results are acceptable throughout: a failed judge call loses
//! only its own scope, and the run report is persisted as long as at
//! least one chapter produced a record.

pub mod chunk;
pub mod config;
pub mod dedup;
pub mod harness;
pub mod hierarchy;
pub mod judge;
pub mod report;
pub mod rubric;

pub use chunk::partition;
pub use dedup::SeenCards;
pub use harness::{EvalRunner, RunnerOptions};
pub use hierarchy::{resolve, typed_rows, Book, Card, Chapter, Hierarchy, Subject, Topic};
pub use judge::{AccuracyVerdict, CardVerdict, Judge, ScoredVerdict};
pub use report::{AccuracyReport, CardResult, ChapterRecord, RunReport, TopicEvaluation};
pub use rubric::Rubric;
