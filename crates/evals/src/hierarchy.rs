//! Hierarchy resolution
//!
//! The store hands back loose JSON rows; this module is the typing
//! boundary. Rows missing a required field are dropped here, with a
//! warning, so nothing downstream ever sees a half-formed entity.
//!
//! Containment is Subject → Book → Chapter → Topic → Card, but there is
//! no recursion anywhere: grouping is plain reference equality on parent
//! ids, held in flat maps.

use std::collections::HashMap;

use common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A subject within a class (e.g. class "8", subject "Arts")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub class_name: String,
    pub subject_name: String,
}

/// A book belonging to a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub subject_id: String,
}

/// A chapter within a book, ordered by `order_index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub book_id: String,
    pub name: String,
    pub order_index: i64,
}

/// A topic within a chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub chapter_id: String,
    pub name: String,
}

/// A flashcard: `front` is the question, `back` the answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub topic_id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub card_type: Option<String>,
}

/// Parse loose store rows into typed entities, dropping malformed rows.
pub fn typed_rows<T: DeserializeOwned>(collection: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(collection, "dropping malformed row: {}", e);
                None
            }
        })
        .collect()
}

/// The slice of the hierarchy relevant to one selected subject/book
#[derive(Debug)]
pub struct Hierarchy {
    pub subject: Subject,
    pub book: Book,
    /// Chapters of the selected book, `order_index` ascending
    pub chapters: Vec<Chapter>,
    topics_by_chapter: HashMap<String, Vec<Topic>>,
    cards_by_topic: HashMap<String, Vec<Card>>,
}

impl Hierarchy {
    /// Topics of a chapter, in fetch order
    pub fn chapter_topics(&self, chapter_id: &str) -> &[Topic] {
        self.topics_by_chapter
            .get(chapter_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cards of a topic, in fetch order
    pub fn topic_cards(&self, topic_id: &str) -> &[Card] {
        self.cards_by_topic
            .get(topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All cards of a chapter: topic order, then card order within a topic
    pub fn chapter_cards(&self, chapter_id: &str) -> Vec<&Card> {
        self.chapter_topics(chapter_id)
            .iter()
            .flat_map(|topic| self.topic_cards(&topic.id).iter())
            .collect()
    }

    /// Display name of a topic, if it belongs to the selected book
    pub fn topic_name(&self, topic_id: &str) -> Option<&str> {
        self.topics_by_chapter
            .values()
            .flatten()
            .find(|t| t.id == topic_id)
            .map(|t| t.name.as_str())
    }

    /// Total number of cards across all selected chapters
    pub fn card_count(&self) -> usize {
        self.cards_by_topic.values().map(Vec::len).sum()
    }
}

/// Resolve the hierarchy for one subject/book.
///
/// Selection is first-match: the subject whose class label equals
/// `class_label` and whose name equals `subject_name` case-insensitively,
/// then the first book referencing that subject. Finding neither is a
/// setup error — there is nothing to evaluate.
pub fn resolve(
    subjects: Vec<Subject>,
    books: Vec<Book>,
    chapters: Vec<Chapter>,
    topics: Vec<Topic>,
    cards: Vec<Card>,
    class_label: &str,
    subject_name: &str,
) -> Result<Hierarchy> {
    let subject = subjects
        .into_iter()
        .find(|s| s.class_name == class_label && s.subject_name.eq_ignore_ascii_case(subject_name))
        .ok_or_else(|| {
            Error::Setup(format!(
                "no subject named '{}' for class '{}'",
                subject_name, class_label
            ))
        })?;

    let book = books
        .into_iter()
        .find(|b| b.subject_id == subject.id)
        .ok_or_else(|| {
            Error::Setup(format!(
                "no book for subject '{}' (class '{}')",
                subject.subject_name, subject.class_name
            ))
        })?;

    let mut selected_chapters: Vec<Chapter> = chapters
        .into_iter()
        .filter(|c| c.book_id == book.id)
        .collect();
    selected_chapters.sort_by_key(|c| c.order_index);

    let mut topics_by_chapter: HashMap<String, Vec<Topic>> = HashMap::new();
    for topic in topics {
        if selected_chapters.iter().any(|c| c.id == topic.chapter_id) {
            topics_by_chapter
                .entry(topic.chapter_id.clone())
                .or_default()
                .push(topic);
        }
    }

    let mut cards_by_topic: HashMap<String, Vec<Card>> = HashMap::new();
    for card in cards {
        if topics_by_chapter
            .values()
            .flatten()
            .any(|t| t.id == card.topic_id)
        {
            cards_by_topic
                .entry(card.topic_id.clone())
                .or_default()
                .push(card);
        }
    }

    Ok(Hierarchy {
        subject,
        book,
        chapters: selected_chapters,
        topics_by_chapter,
        cards_by_topic,
    })
}
