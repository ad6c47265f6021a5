//! Deterministic keyword-count classifier.
//!
//! The heuristic stand-in for the real model: counts positive and negative
//! marker words and emits fixed scores. Useful wherever tests need the
//! aggregation and blending layers to behave identically run to run.

use crate::domain::sentiment::{SentimentClassifier, SentimentLabel, SentimentScore};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "positive", "up", "gain", "profit", "strong",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "down", "loss", "weak", "decline", "fall",
];

pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> SentimentScore {
        let text_lower = text.to_lowercase();

        let pos_count = POSITIVE_WORDS
            .iter()
            .filter(|w| text_lower.contains(*w))
            .count();
        let neg_count = NEGATIVE_WORDS
            .iter()
            .filter(|w| text_lower.contains(*w))
            .count();

        let (label, score) = if pos_count > neg_count {
            (SentimentLabel::Positive, 0.7)
        } else if neg_count > pos_count {
            (SentimentLabel::Negative, -0.7)
        } else {
            (SentimentLabel::Neutral, 0.0)
        };

        SentimentScore {
            label,
            score,
            confidence: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_decide_polarity() {
        let classifier = KeywordClassifier::new();

        let result = classifier.classify("Strong profit and excellent gain this quarter");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.score, 0.7);
        assert_eq!(result.confidence, 0.6);

        let result = classifier.classify("Weak quarter, heavy loss and decline");
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.score, -0.7);
    }

    #[test]
    fn balanced_or_empty_text_is_neutral() {
        let classifier = KeywordClassifier::new();
        assert_eq!(
            classifier.classify("good but bad").label,
            SentimentLabel::Neutral
        );
        assert_eq!(classifier.classify("").label, SentimentLabel::Neutral);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = KeywordClassifier::new();
        let a = classifier.classify("strong gain");
        let b = classifier.classify("strong gain");
        assert_eq!(a, b);
    }
}
