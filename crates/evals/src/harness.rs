//! Evaluation orchestrator
//!
//! Drives one run over the resolved hierarchy: chapters strictly in
//! order, and within a chapter the fixed stage sequence of document
//! binding, text extraction, summarization, chapter-level scoring,
//! topic-level scoring, and chunked card-level scoring. A stage that
//! produces nothing skips the chapter; a failed judge call only loses
//! its own scope. Everything is sequential — one judge call in flight
//! at a time, with a mandatory pause after each to respect rate limits.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use llm::ChatModel;
use pdftext::TextExtractor;
use tracing::{debug, info, warn};

use crate::chunk::partition;
use crate::dedup::SeenCards;
use crate::hierarchy::{Card, Chapter, Hierarchy};
use crate::judge::{CardPayload, CardQuestion, CardVerdict, Judge};
use crate::report::{
    AccuracyRecord, AccuracyReport, CardResult, ChapterRecord, RunReport, TopicEvaluation,
};

/// Tunables for one run
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Cards per card-level judge request
    pub chunk_size: usize,
    /// Base pause after each judge call; card-chunk calls pause twice as
    /// long. Set to zero under test.
    pub call_delay: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            call_delay: Duration::from_secs(1),
        }
    }
}

/// Orchestrates one evaluation run
///
/// Owns all intermediate state for the duration of the run; nothing
/// persists between runs except the written report.
pub struct EvalRunner<'a, M: ChatModel> {
    judge: Judge<M>,
    extractor: &'a dyn TextExtractor,
    options: RunnerOptions,
}

impl<'a, M: ChatModel> EvalRunner<'a, M> {
    pub fn new(judge: Judge<M>, extractor: &'a dyn TextExtractor, options: RunnerOptions) -> Self {
        Self {
            judge,
            extractor,
            options,
        }
    }

    /// Run the three-tier evaluation over every chapter.
    ///
    /// `documents` is the ordered list of source documents; the chapter at
    /// ordinal position i is paired with the i-th document.
    pub async fn run(&self, hierarchy: &Hierarchy, documents: &[PathBuf]) -> RunReport {
        let mut report = RunReport::new(
            hierarchy.subject.class_name.clone(),
            hierarchy.subject.subject_name.clone(),
        );
        let mut seen = SeenCards::new();
        let total = hierarchy.chapters.len();

        for (i, chapter) in hierarchy.chapters.iter().enumerate() {
            info!("processing chapter {}/{}: '{}'", i + 1, total, chapter.name);

            let Some((summary, cards)) = self.prepare_chapter(hierarchy, i, documents).await
            else {
                continue;
            };

            // Chapter-level: one call over every question in the chapter
            let questions: Vec<CardQuestion> = cards
                .iter()
                .map(|c| CardQuestion {
                    id: c.id.clone(),
                    question: c.front.clone(),
                })
                .collect();
            let exhaustiveness = self
                .judge
                .chapter_exhaustiveness(&chapter.name, &summary, &questions)
                .await;
            self.pause(1).await;

            // Topic-level: one call per topic that actually has cards
            let mut optimal_card_count_per_topic = Vec::new();
            for topic in hierarchy.chapter_topics(&chapter.id) {
                let topic_cards = hierarchy.topic_cards(&topic.id);
                if topic_cards.is_empty() {
                    continue;
                }
                debug!("evaluating card count for topic '{}'", topic.name);
                let topic_questions: Vec<CardQuestion> = topic_cards
                    .iter()
                    .map(|c| CardQuestion {
                        id: c.id.clone(),
                        question: c.front.clone(),
                    })
                    .collect();
                let evaluation = self
                    .judge
                    .topic_card_count(&topic.name, &summary, &topic_questions)
                    .await;
                optimal_card_count_per_topic.push(TopicEvaluation {
                    topic_name: topic.name.clone(),
                    evaluation,
                });
                self.pause(1).await;
            }

            // Card-level: chunked calls, verdicts reconciled per chunk
            let verdicts = self
                .evaluate_card_chunks(&chapter.name, &summary, &cards)
                .await;

            // One result per card that obtained a verdict, in card order
            let mut card_evaluations = Vec::new();
            for card in &cards {
                let Some(verdict) = verdicts.get(card.id.as_str()) else {
                    continue;
                };
                let is_repeated = seen.check_and_record(&card.front, &card.back);
                card_evaluations.push(CardResult {
                    card_id: card.id.clone(),
                    question: card.front.clone(),
                    answer: card.back.clone(),
                    correctness: verdict.correctness.clone(),
                    relevance: verdict.relevance.clone(),
                    is_repeated,
                });
            }

            report.push(ChapterRecord {
                chapter_name: chapter.name.clone(),
                exhaustiveness,
                optimal_card_count_per_topic,
                card_evaluations,
            });
            info!("chapter '{}' evaluated", chapter.name);
        }

        report
    }

    /// Run the factual-accuracy pass: every card scored 1-4 against the
    /// raw chapter text, anchored by the golden dataset.
    pub async fn run_accuracy(
        &self,
        hierarchy: &Hierarchy,
        documents: &[PathBuf],
        golden_dataset: &serde_json::Value,
    ) -> AccuracyReport {
        let mut report = AccuracyReport::new(
            hierarchy.subject.class_name.clone(),
            hierarchy.subject.subject_name.clone(),
        );
        let mut seen = SeenCards::new();
        let total = hierarchy.chapters.len();

        for (i, chapter) in hierarchy.chapters.iter().enumerate() {
            info!("accuracy pass {}/{}: '{}'", i + 1, total, chapter.name);

            let Some(text) = self.bind_and_extract(chapter, i, documents) else {
                continue;
            };

            let cards = hierarchy.chapter_cards(&chapter.id);
            if cards.is_empty() {
                debug!("chapter '{}' has no cards, skipping", chapter.name);
                continue;
            }

            let payloads: Vec<CardPayload> = cards
                .iter()
                .map(|c| CardPayload {
                    card_id: c.id.clone(),
                    question: c.front.clone(),
                    answer: c.back.clone(),
                })
                .collect();
            let chunks = partition(&payloads, self.options.chunk_size);
            let chunk_count = chunks.len();

            let mut verdicts = HashMap::new();
            for (j, chunk) in chunks.into_iter().enumerate() {
                debug!(
                    "evaluating accuracy chunk {}/{} for '{}'",
                    j + 1,
                    chunk_count,
                    chapter.name
                );
                match self.judge.card_accuracy(&text, chunk, golden_dataset).await {
                    Some(batch) => {
                        for verdict in batch {
                            if chunk.iter().any(|c| c.card_id == verdict.card_id) {
                                verdicts.insert(verdict.card_id.clone(), verdict);
                            } else {
                                warn!(
                                    "dropping accuracy verdict for unknown card '{}' (chunk {} of '{}')",
                                    verdict.card_id,
                                    j + 1,
                                    chapter.name
                                );
                            }
                        }
                    }
                    None => warn!(
                        "accuracy chunk {}/{} of '{}' produced no verdicts",
                        j + 1,
                        chunk_count,
                        chapter.name
                    ),
                }
                self.pause(2).await;
            }

            for card in &cards {
                let Some(verdict) = verdicts.get(card.id.as_str()) else {
                    continue;
                };
                let is_repeated = seen.check_and_record(&card.front, &card.back);
                report.cards.push(AccuracyRecord {
                    card_id: card.id.clone(),
                    topic_name: hierarchy
                        .topic_name(&card.topic_id)
                        .unwrap_or("Uncategorized")
                        .to_string(),
                    question: card.front.clone(),
                    answer: card.back.clone(),
                    accuracy_score: verdict.accuracy_score,
                    confidence_score: verdict.confidence_score,
                    rationale: verdict.rationale.clone(),
                    is_repeated,
                });
            }
        }

        report
    }

    /// Bind the i-th document to the chapter and pull its text. `None`
    /// means the chapter has nothing to evaluate against and is skipped.
    fn bind_and_extract(
        &self,
        chapter: &Chapter,
        index: usize,
        documents: &[PathBuf],
    ) -> Option<String> {
        let Some(document) = documents.get(index) else {
            warn!("no document for chapter '{}', skipping", chapter.name);
            return None;
        };

        let Some(text) = self.extractor.extract(document) else {
            warn!("no text for chapter '{}', skipping", chapter.name);
            return None;
        };

        Some(text)
    }

    /// Document binding and extraction plus summarization: `None` means
    /// the chapter is skipped.
    async fn prepare_chapter<'h>(
        &self,
        hierarchy: &'h Hierarchy,
        index: usize,
        documents: &[PathBuf],
    ) -> Option<(String, Vec<&'h Card>)> {
        let chapter = &hierarchy.chapters[index];
        let text = self.bind_and_extract(chapter, index, documents)?;

        let summary = self.judge.summarize(&chapter.name, &text).await?;
        self.pause(1).await;

        let cards = hierarchy.chapter_cards(&chapter.id);
        if cards.is_empty() {
            debug!("chapter '{}' has no cards, skipping", chapter.name);
            return None;
        }

        Some((summary, cards))
    }

    /// Card-level evaluation: one judge call per chunk. Verdicts naming a
    /// card outside their own chunk are dropped; a failed chunk simply
    /// contributes nothing.
    async fn evaluate_card_chunks(
        &self,
        chapter_name: &str,
        summary: &str,
        cards: &[&Card],
    ) -> HashMap<String, CardVerdict> {
        let payloads: Vec<CardPayload> = cards
            .iter()
            .map(|c| CardPayload {
                card_id: c.id.clone(),
                question: c.front.clone(),
                answer: c.back.clone(),
            })
            .collect();
        let chunks = partition(&payloads, self.options.chunk_size);
        let chunk_count = chunks.len();

        let mut verdicts = HashMap::new();
        for (j, chunk) in chunks.into_iter().enumerate() {
            debug!(
                "evaluating card chunk {}/{} for '{}'",
                j + 1,
                chunk_count,
                chapter_name
            );
            match self.judge.card_chunk(summary, chunk).await {
                Some(batch) => {
                    for verdict in batch {
                        if chunk.iter().any(|c| c.card_id == verdict.card_id) {
                            verdicts.insert(verdict.card_id.clone(), verdict);
                        } else {
                            warn!(
                                "dropping verdict for unknown card '{}' (chunk {} of '{}')",
                                verdict.card_id,
                                j + 1,
                                chapter_name
                            );
                        }
                    }
                }
                None => warn!(
                    "card chunk {}/{} of '{}' produced no verdicts",
                    j + 1,
                    chunk_count,
                    chapter_name
                ),
            }
            self.pause(2).await;
        }

        verdicts
    }

    async fn pause(&self, factor: u32) {
        let delay = self.options.call_delay * factor;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
