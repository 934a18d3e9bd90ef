//! Duplicate card detection
//!
//! Tracks (question, answer) pairs seen over one run. Exact membership
//! only; no normalization or fuzzy matching.

use std::collections::HashSet;

/// Run-scoped set of card contents already seen
#[derive(Debug, Default)]
pub struct SeenCards {
    seen: HashSet<(String, String)>,
}

impl SeenCards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this exact (question, answer) pair was seen before;
    /// records it either way.
    pub fn check_and_record(&mut self, question: &str, answer: &str) -> bool {
        !self
            .seen
            .insert((question.to_string(), answer.to_string()))
    }

    /// Number of distinct pairs recorded so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_is_not_a_repeat() {
        let mut seen = SeenCards::new();
        assert!(!seen.check_and_record("What is texture?", "How things feel"));
        assert!(seen.check_and_record("What is texture?", "How things feel"));
        assert!(seen.check_and_record("What is texture?", "How things feel"));
    }

    #[test]
    fn test_repeat_survives_many_interleaved_pairs() {
        let mut seen = SeenCards::new();
        assert!(!seen.check_and_record("q", "a"));

        for i in 0..500 {
            assert!(!seen.check_and_record(&format!("q{}", i), &format!("a{}", i)));
        }

        assert!(seen.check_and_record("q", "a"));
        assert_eq!(seen.len(), 501);
    }

    #[test]
    fn test_same_question_different_answer_is_distinct() {
        let mut seen = SeenCards::new();
        assert!(!seen.check_and_record("q", "a"));
        assert!(!seen.check_and_record("q", "b"));
    }
}
