//! Run reports
//!
//! Per-chapter verdicts are merged into one record per chapter, appended
//! in processing order, and the whole run is written out once at the end.
//! A run that produced no chapter records writes nothing.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use common::Result;
use serde::{Deserialize, Serialize};

use crate::judge::ScoredVerdict;

/// Topic-level verdict, `None` when the judge call failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEvaluation {
    pub topic_name: String,
    pub evaluation: Option<ScoredVerdict>,
}

/// Aggregated result for one card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardResult {
    pub card_id: String,
    pub question: String,
    pub answer: String,
    pub correctness: ScoredVerdict,
    pub relevance: ScoredVerdict,
    pub is_repeated: bool,
}

/// Aggregated result for one chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter_name: String,
    /// `None` when the chapter-level judge call failed
    pub exhaustiveness: Option<ScoredVerdict>,
    pub optimal_card_count_per_topic: Vec<TopicEvaluation>,
    pub card_evaluations: Vec<CardResult>,
}

/// Full three-tier run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub class_name: String,
    pub subject_name: String,
    pub chapters: Vec<ChapterRecord>,
}

impl RunReport {
    pub fn new(class_name: impl Into<String>, subject_name: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            class_name: class_name.into(),
            subject_name: subject_name.into(),
            chapters: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ChapterRecord) {
        self.chapters.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Write the report as pretty-printed JSON, overwriting any previous
    /// run. Returns false (and writes nothing) if no chapter produced a
    /// record.
    pub fn save(&self, path: &Path) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(true)
    }

    /// Print a console summary of the run
    pub fn print_summary(&self) {
        println!("\n========== EVALUATION REPORT ==========\n");
        println!(
            "Class {} {} - {} chapter(s) evaluated",
            self.class_name, self.subject_name, self.chapters.len()
        );

        for record in &self.chapters {
            let exhaustiveness = record
                .exhaustiveness
                .as_ref()
                .map(|v| format!("{}/5", v.score))
                .unwrap_or_else(|| "no verdict".to_string());
            println!(
                "\n  {} - exhaustiveness: {}",
                record.chapter_name, exhaustiveness
            );

            for topic in &record.optimal_card_count_per_topic {
                let score = topic
                    .evaluation
                    .as_ref()
                    .map(|v| format!("{}/5", v.score))
                    .unwrap_or_else(|| "no verdict".to_string());
                println!("    topic '{}': card count {}", topic.topic_name, score);
            }

            let repeats = record
                .card_evaluations
                .iter()
                .filter(|c| c.is_repeated)
                .count();
            println!(
                "    cards: {} evaluated, {} repeated",
                record.card_evaluations.len(),
                repeats
            );
        }
        println!("\n========================================\n");
    }
}

/// Aggregated result for one card in the accuracy pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub card_id: String,
    pub topic_name: String,
    pub question: String,
    pub answer: String,
    pub accuracy_score: u8,
    pub confidence_score: u8,
    pub rationale: String,
    pub is_repeated: bool,
}

/// Flat per-card report from the accuracy pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub generated_at: DateTime<Utc>,
    pub class_name: String,
    pub subject_name: String,
    pub cards: Vec<AccuracyRecord>,
}

impl AccuracyReport {
    pub fn new(class_name: impl Into<String>, subject_name: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            class_name: class_name.into(),
            subject_name: subject_name.into(),
            cards: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Same single-write contract as [`RunReport::save`]
    pub fn save(&self, path: &Path) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(true)
    }

    pub fn print_summary(&self) {
        println!("\n========== ACCURACY REPORT ==========\n");
        println!(
            "Class {} {} - {} card(s) evaluated",
            self.class_name,
            self.subject_name,
            self.cards.len()
        );
        if !self.cards.is_empty() {
            let avg: f32 = self.cards.iter().map(|c| c.accuracy_score as f32).sum::<f32>()
                / self.cards.len() as f32;
            let repeats = self.cards.iter().filter(|c| c.is_repeated).count();
            println!("Average accuracy: {:.2}/4, {} repeated card(s)", avg, repeats);
        }
        println!("\n=====================================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(score: u8) -> ScoredVerdict {
        ScoredVerdict {
            score,
            notes: "n".to_string(),
        }
    }

    #[test]
    fn test_empty_report_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let report = RunReport::new("8", "arts");
        assert!(!report.save(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_report_roundtrips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = RunReport::new("8", "arts");
        report.push(ChapterRecord {
            chapter_name: "Elements of Art".to_string(),
            exhaustiveness: Some(verdict(4)),
            optimal_card_count_per_topic: vec![TopicEvaluation {
                topic_name: "Line".to_string(),
                evaluation: None,
            }],
            card_evaluations: vec![CardResult {
                card_id: "k1".to_string(),
                question: "q".to_string(),
                answer: "a".to_string(),
                correctness: verdict(5),
                relevance: verdict(3),
                is_repeated: true,
            }],
        });

        assert!(report.save(&path).unwrap());

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.chapters.len(), 1);
        assert_eq!(loaded.chapters[0].exhaustiveness.as_ref().unwrap().score, 4);
        assert!(loaded.chapters[0].optimal_card_count_per_topic[0]
            .evaluation
            .is_none());
        assert!(loaded.chapters[0].card_evaluations[0].is_repeated);
    }
}
