//! Local NLP-based sentiment classification using VADER
//!
//! Classifies news headlines and article bodies with the VADER (Valence
//! Aware Dictionary and sEntiment Reasoner) algorithm, boosted with a
//! financial keyword lexicon to capture market jargon VADER's general
//! lexicon may miss.

use crate::domain::sentiment::{SentimentClassifier, SentimentLabel, SentimentScore};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Financial keywords and their sentiment scores for boosting VADER output.
const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("beats estimates", 0.5),
    ("beat expectations", 0.5),
    ("bullish", 0.5),
    ("all-time high", 0.5),
    ("record high", 0.4),
    ("breakout", 0.3),
    ("upgrade", 0.3),
    ("upgraded", 0.3),
    ("outperform", 0.3),
    ("buyback", 0.3),
    ("dividend increase", 0.3),
    ("strong earnings", 0.5),
    ("profit", 0.2),
    ("growth", 0.2),
    ("partnership", 0.2),
    ("breakthrough", 0.4),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("crashes", -0.5),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("bearish", -0.5),
    ("collapse", -0.5),
    ("misses estimates", -0.5),
    ("missed expectations", -0.5),
    ("lawsuit", -0.4),
    ("sec probe", -0.4),
    ("investigation", -0.3),
    ("downgrade", -0.4),
    ("downgraded", -0.4),
    ("layoffs", -0.4),
    ("recall", -0.3),
    ("bankruptcy", -0.6),
    ("fraud", -0.5),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("panic", -0.4),
    ("loss", -0.3),
    ("decline", -0.3),
];

/// Maximum text length fed to the analyzer; longer articles are truncated.
const MAX_TEXT_LEN: usize = 512;

/// VADER-backed classifier with financial keyword boosting.
pub struct VaderClassifier {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderClassifier {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn financial_boost(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let mut boost = 0.0;

        for (keyword, score) in BULLISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score;
            }
        }

        for (keyword, score) in BEARISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score; // score is already negative
            }
        }

        boost
    }
}

impl Default for VaderClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace and truncate to the analyzer's working length.
fn preprocess(text: &str) -> String {
    let cleaned = text.trim().replace(['\n', '\r'], " ");
    if cleaned.len() > MAX_TEXT_LEN {
        let mut end = MAX_TEXT_LEN;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned[..end].to_string()
    } else {
        cleaned
    }
}

impl SentimentClassifier for VaderClassifier {
    fn classify(&self, text: &str) -> SentimentScore {
        let cleaned = preprocess(text);
        if cleaned.is_empty() {
            return SentimentScore {
                label: SentimentLabel::Neutral,
                score: 0.0,
                confidence: 0.5,
            };
        }

        let scores = self.analyzer.polarity_scores(&cleaned);
        let vader_score = scores["compound"];
        let boost = self.financial_boost(&cleaned);

        let combined = (vader_score + boost * 0.5).clamp(-1.0, 1.0);

        // stronger polarity reads as a more confident classification
        let confidence = (0.5 + combined.abs() * 0.4).min(0.9);

        SentimentScore {
            label: SentimentLabel::from_score(combined),
            score: combined,
            confidence,
        }
    }
}
