//! Scoring rubrics
//!
//! Each judge prompt embeds worked "golden" calibration examples so scores
//! stay anchored between runs. The text is configuration, not logic: the
//! compiled-in defaults match the prompts the scores were originally
//! calibrated against, and any block can be overridden from a TOML file.
//! Callers who care about score reproducibility should keep the rubric
//! file alongside their historical reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Rubric text blocks, one per judge prompt kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    /// Golden examples for chapter-level exhaustiveness (1-5)
    #[serde(default = "default_exhaustiveness")]
    pub exhaustiveness: String,
    /// Golden examples for topic-level card-count adequacy (1-5)
    #[serde(default = "default_card_count")]
    pub card_count: String,
    /// Golden examples for card-level correctness and relevance (1-5 each)
    #[serde(default = "default_card_quality")]
    pub card_quality: String,
    /// Scoring scale for factual accuracy against reference text (1-4)
    #[serde(default = "default_accuracy_scale")]
    pub accuracy_scale: String,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            exhaustiveness: default_exhaustiveness(),
            card_count: default_card_count(),
            card_quality: default_card_quality(),
            accuracy_scale: default_accuracy_scale(),
        }
    }
}

impl Rubric {
    /// Load a rubric override from a TOML file. Missing blocks fall back
    /// to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rubric file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse rubric file: {}", path.display()))
    }
}

fn default_exhaustiveness() -> String {
    r#"*   **Low Rating (1/5):** A card set for a chapter on 'Elements of Art' only contains cards about the element 'Line'. It completely ignores other crucial elements like Color, Shape, Form, Texture, and Space. **Rationale:** 'The card set is not exhaustive. It focuses on a single sub-topic while ignoring the majority of the chapter's core concepts.'
*   **Moderate Rating (3/5):** A card set for a chapter on 'Indian Folk Art' covers Madhubani and Warli painting but omits Kalamkari and Gond art, which are also detailed in the chapter. **Rationale:** 'The set is partially exhaustive, covering some major topics but missing others, providing an incomplete overview.'
*   **High Rating (5/5):** A card set for a chapter on 'Elements of Art' has dedicated cards for Line, Shape, Form, Color (including primary/secondary), Texture, and Space, matching the chapter structure. **Rationale:** 'The card set is fully exhaustive, covering all major and minor concepts presented in the reference text.'"#
        .to_string()
}

fn default_card_count() -> String {
    r#"*   **Low Rating (1/5):** A topic on 'Color Theory' has only one card: "What are the primary colors?" **Rationale:** 'Too few. This complex topic requires more cards to cover secondary colors, complementary colors, and color temperature to be useful.'
*   **Moderate Rating (3/5):** A topic on 'Warli Painting' has 10 cards, but 7 of them are minor variations of "What shape is used in Warli art?" **Rationale:** 'Suboptimal. The card count is inflated with repetitive questions, while other aspects like themes and materials are neglected.'
*   **High Rating (5/5):** A topic on 'Madhubani Painting' has 5 cards, covering its origin, key characteristics (e.g., geometric patterns), common themes (nature, mythology), and materials used. **Rationale:** 'Optimal. The number of cards is sufficient to cover the topic comprehensively without being redundant.'"#
        .to_string()
}

fn default_card_quality() -> String {
    r#"*   **Correctness (1/5):** Q: 'What are the primary colors?' A: 'Blue, Green, and Yellow.' **Rationale:** 'Factually incorrect. Green is a secondary color, not primary.'
*   **Correctness (3/5):** Q: 'What is a landscape?' A: 'A painting of the outdoors.' **Rationale:** 'Correct but imprecise. It lacks detail, such as mentioning that landscapes typically feature natural scenery like mountains, rivers, or forests.'
*   **Correctness (5/5):** Q: 'What is texture in art?' A: 'Texture is the element of art that refers to the way things feel, or look as if they might feel if touched.' **Rationale:** 'Perfectly correct, clear, and well-defined.'
*   **Relevance/Completeness (1/5):** Q: 'What is Madhubani art?' A: 'It is a famous art style.' **Rationale:** 'The answer is completely irrelevant and incomplete. It provides no specific information about Madhubani art.'
*   **Relevance/Completeness (3/5):** Q: 'What are the key features of Warli painting?' A: 'They use geometric shapes like circles, triangles, and squares.' **Rationale:** 'Relevant but incomplete. It answers part of the question but omits other key features like the use of a white pigment on an earthen background and themes of daily life.'
*   **Relevance/Completeness (5/5):** Q: 'What are the key features of Warli painting?' A: 'Warli paintings are characterized by their use of basic geometric shapes (circles, triangles, squares), a monochrome palette (white pigment on a red or brown background), and themes depicting scenes from daily life, nature, and rituals.' **Rationale:** 'Perfectly relevant and complete, addressing all aspects of the question.'"#
        .to_string()
}

fn default_accuracy_scale() -> String {
    r#"*   **1 (Incorrect):** Factually wrong, not in text.
*   **2 (External):** Correct, but not in text.
*   **3 (Partial):** Combines text with external info.
*   **4 (Fully verifiable):** Accurate, directly verifiable from text."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_rubric_has_all_blocks() {
        let rubric = Rubric::default();
        assert!(rubric.exhaustiveness.contains("Elements of Art"));
        assert!(rubric.card_count.contains("Color Theory"));
        assert!(rubric.card_quality.contains("Correctness (5/5)"));
        assert!(rubric.accuracy_scale.contains("Fully verifiable"));
    }

    #[test]
    fn test_partial_override_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "exhaustiveness = \"custom anchors\"").unwrap();

        let rubric = Rubric::load(file.path()).unwrap();
        assert_eq!(rubric.exhaustiveness, "custom anchors");
        assert_eq!(rubric.card_count, Rubric::default().card_count);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(Rubric::load(Path::new("/nonexistent/rubric.toml")).is_err());
    }
}
