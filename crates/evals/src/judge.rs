//! LLM-based flashcard evaluation
//!
//! Builds one prompt per evaluation unit (whole chapter, one topic, one
//! card chunk), sends it to the judge model, and parses the response into
//! typed verdicts. Failure at any point — transport, empty response, bad
//! JSON — yields `None` with a logged cause. `None` means "no verdict
//! obtained", never a zero score; callers must not substitute one.

use llm::ChatModel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rubric::Rubric;

/// A single scored judgment with free-form notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredVerdict {
    pub score: u8,
    #[serde(default)]
    pub notes: String,
}

/// Per-card verdict from a chunk evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardVerdict {
    pub card_id: String,
    pub correctness: ScoredVerdict,
    pub relevance: ScoredVerdict,
}

/// Per-card verdict from a factual-accuracy evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyVerdict {
    pub card_id: String,
    pub accuracy_score: u8,
    pub confidence_score: u8,
    #[serde(default)]
    pub rationale: String,
}

/// Card identity + question, the payload for chapter/topic prompts
#[derive(Debug, Clone, Serialize)]
pub struct CardQuestion {
    pub id: String,
    pub question: String,
}

/// Full card payload for chunk prompts
#[derive(Debug, Clone, Serialize)]
pub struct CardPayload {
    pub card_id: String,
    pub question: String,
    pub answer: String,
}

const SYSTEM_PROMPT: &str = "You are an evaluation judge for machine-generated educational \
flashcards. Follow the task instructions exactly and respond with only the requested output.";

/// LLM judge for flashcard evaluation
pub struct Judge<M: ChatModel> {
    model: M,
    rubric: Rubric,
}

impl<M: ChatModel> Judge<M> {
    /// Create a new judge over the given model and rubric
    pub fn new(model: M, rubric: Rubric) -> Self {
        Self { model, rubric }
    }

    /// Produce a structured summary of a chapter's text.
    ///
    /// The summary is the reference text for the three-tier prompts;
    /// without it the chapter cannot be scored.
    pub async fn summarize(&self, chapter_name: &str, chapter_text: &str) -> Option<String> {
        let prompt = format!(
            "Please create a concise, structured summary of the following book chapter text, \
focusing on all key concepts, definitions, and facts. Return only the summary text.\n\n\
**Chapter Text:**\n{chapter_text}"
        );

        match self.model.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(summary) if !summary.trim().is_empty() => Some(summary),
            Ok(_) => {
                warn!("empty summary for chapter '{}'", chapter_name);
                None
            }
            Err(e) => {
                warn!("summary failed for chapter '{}': {}", chapter_name, e);
                None
            }
        }
    }

    /// Does the whole card set cover everything the chapter covers? (1-5)
    pub async fn chapter_exhaustiveness(
        &self,
        chapter_name: &str,
        summary: &str,
        questions: &[CardQuestion],
    ) -> Option<ScoredVerdict> {
        let prompt = format!(
            r#"**Task:** Evaluate if the entire set of flashcard questions for the chapter comprehensively covers all topics in the provided summary.
**Chapter Summary:**
{summary}
**All Flashcard Questions:**
{questions}

**Golden Examples:**
{rubric}

**IMPORTANT: The score MUST be an integer between 1 (very bad) and 5 (very good).**

**Required Output (Strict JSON):**
{{ "score": <integer>, "notes": "<string>" }}"#,
            questions = to_json(questions),
            rubric = self.rubric.exhaustiveness,
        );

        self.ask(&format!("exhaustiveness of '{}'", chapter_name), &prompt)
            .await
    }

    /// Is the number of cards for one topic optimal? (1-5)
    pub async fn topic_card_count(
        &self,
        topic_name: &str,
        summary: &str,
        questions: &[CardQuestion],
    ) -> Option<ScoredVerdict> {
        let prompt = format!(
            r#"**Task:** Based on the chapter summary, evaluate if the number of flashcards for the topic '{topic_name}' is optimal (not too many, not too few).
**Chapter Summary:**
{summary}
**Topic Flashcard Questions:**
{questions}

**Golden Examples:**
{rubric}

**IMPORTANT: The score MUST be an integer between 1 (very bad) and 5 (very good).**

**Required Output (Strict JSON):**
{{ "score": <integer>, "notes": "<string>" }}"#,
            questions = to_json(questions),
            rubric = self.rubric.card_count,
        );

        self.ask(&format!("card count for topic '{}'", topic_name), &prompt)
            .await
    }

    /// Correctness and relevance for every card in one chunk (1-5 each)
    pub async fn card_chunk(
        &self,
        summary: &str,
        chunk: &[CardPayload],
    ) -> Option<Vec<CardVerdict>> {
        let prompt = format!(
            r#"**Task:** For each card in the chunk, evaluate its correctness and relevance based on the chapter summary.
**Chapter Summary:**
{summary}
**Flashcard Chunk:**
{chunk}

**Golden Examples:**
{rubric}

**IMPORTANT: All scores MUST be an integer between 1 (very bad) and 5 (very good).**

**Required Output (Strict JSON):** A list of evaluation objects.
[
  {{
    "card_id": "<uuid>",
    "correctness": {{ "score": <integer>, "notes": "<string>" }},
    "relevance": {{ "score": <integer>, "notes": "<string>" }}
  }}
]"#,
            chunk = to_json(chunk),
            rubric = self.rubric.card_quality,
        );

        self.ask("card chunk", &prompt).await
    }

    /// Factual accuracy against the raw chapter text (1-4, plus a 0-100
    /// confidence score), anchored by a caller-supplied golden dataset.
    pub async fn card_accuracy(
        &self,
        chapter_text: &str,
        chunk: &[CardPayload],
        golden_dataset: &serde_json::Value,
    ) -> Option<Vec<AccuracyVerdict>> {
        let prompt = format!(
            r#"You are an accuracy evaluator for educational flashcards. Evaluate answers based *only* on the provided reference chapter text.

**Reference Chapter Text:**
--- START OF TEXT ---
{chapter_text}
--- END OF TEXT ---

**Scoring Scale (4-point):**
{rubric}

**Golden Standard Examples:**
{golden}

**Evaluation Task:**
For each flashcard in the chunk below, provide accuracy (1-4) and confidence (0-100) scores. Base judgment *solely* on the reference text.

**Flashcard Chunk to Evaluate:**
{chunk}

**Required Output (Strict JSON):**
Respond with only a valid JSON list of evaluation objects. No other text or formatting.
[
  {{
    "card_id": "<uuid>",
    "accuracy_score": <integer_1_to_4>,
    "confidence_score": <integer_0_to_100>,
    "rationale": "<brief explanation>"
  }}
]
Provide a concise rationale (1-2 sentences) for each card's scores, explaining *why* based *only* on the reference text."#,
            rubric = self.rubric.accuracy_scale,
            golden = to_json(golden_dataset),
            chunk = to_json(chunk),
        );

        self.ask("accuracy chunk", &prompt).await
    }

    /// Issue one judge call and parse the response. Any failure is logged
    /// and collapses to `None`.
    async fn ask<T: DeserializeOwned>(&self, what: &str, prompt: &str) -> Option<T> {
        let response = match self.model.complete(SYSTEM_PROMPT, prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("judge call failed ({}): {}", what, e);
                return None;
            }
        };

        match serde_json::from_str(extract_json(&response)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("unparseable judge response ({}): {}", what, e);
                None
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Extract JSON from a response that may be wrapped in markdown code blocks
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_start = &trimmed[start + 3..];
        let json_start = if after_start.starts_with("json") {
            after_start.find('\n').map(|i| i + 1).unwrap_or(0)
        } else if after_start.starts_with('\n') {
            1
        } else {
            0
        };
        let content = &after_start[json_start..];
        if let Some(end) = content.find("```") {
            return content[..end].trim();
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted model: pops canned responses in order
    struct ScriptedModel {
        responses: Mutex<Vec<Result<String, String>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            let mut responses = self.responses.lock().unwrap();
            match responses.remove(0) {
                Ok(text) => Ok(text),
                Err(e) => Err(anyhow::anyhow!(e)),
            }
        }
    }

    fn questions() -> Vec<CardQuestion> {
        vec![CardQuestion {
            id: "k1".to_string(),
            question: "What is texture?".to_string(),
        }]
    }

    #[test]
    fn test_to_json_renders_slices() {
        // Prompt payloads are passed as unsized slices
        let rendered = to_json(&questions()[..]);
        assert!(rendered.contains("What is texture?"));
    }

    #[test]
    fn test_extract_json_fenced() {
        let input = "```json\n{ \"score\": 4, \"notes\": \"solid\" }\n```";
        let json = extract_json(input);
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_extract_json_bare() {
        let input = "  [{\"card_id\": \"k1\"}]  ";
        assert_eq!(extract_json(input), "[{\"card_id\": \"k1\"}]");
    }

    #[tokio::test]
    async fn test_chapter_eval_parses_fenced_verdict() {
        let model = ScriptedModel::new(vec![Ok(
            "```json\n{ \"score\": 4, \"notes\": \"covers most concepts\" }\n```".to_string(),
        )]);
        let judge = Judge::new(model, Rubric::default());

        let verdict = judge
            .chapter_exhaustiveness("Elements of Art", "summary", &questions())
            .await
            .unwrap();
        assert_eq!(verdict.score, 4);
        assert_eq!(verdict.notes, "covers most concepts");
    }

    #[tokio::test]
    async fn test_malformed_response_yields_none() {
        let model = ScriptedModel::new(vec![Ok("I cannot evaluate this.".to_string())]);
        let judge = Judge::new(model, Rubric::default());

        assert!(judge
            .chapter_exhaustiveness("ch", "summary", &questions())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let model = ScriptedModel::new(vec![Err("429 too many requests".to_string())]);
        let judge = Judge::new(model, Rubric::default());

        assert!(judge
            .topic_card_count("Line", "summary", &questions())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_card_chunk_parses_list() {
        let model = ScriptedModel::new(vec![Ok(r#"[
            { "card_id": "k1",
              "correctness": { "score": 5, "notes": "exact" },
              "relevance": { "score": 4, "notes": "on topic" } }
        ]"#
        .to_string())]);
        let judge = Judge::new(model, Rubric::default());

        let chunk = vec![CardPayload {
            card_id: "k1".to_string(),
            question: "q".to_string(),
            answer: "a".to_string(),
        }];
        let verdicts = judge.card_chunk("summary", &chunk).await.unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].correctness.score, 5);
        assert_eq!(verdicts[0].relevance.score, 4);
    }

    #[tokio::test]
    async fn test_empty_summary_yields_none() {
        let model = ScriptedModel::new(vec![Ok("   ".to_string())]);
        let judge = Judge::new(model, Rubric::default());
        assert!(judge.summarize("ch", "text").await.is_none());
    }
}
