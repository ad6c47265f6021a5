use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

impl SentimentLabel {
    /// Label from a score in [-1, 1]. The ±0.1 band matches the thresholds
    /// used when counting articles per polarity during aggregation.
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            Self::Positive
        } else if score < -0.1 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// One classified piece of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    /// Polarity in [-1, 1].
    pub score: f64,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
}

/// Aggregated news sentiment for one ticker over a time window.
/// Derived per request; never persisted by the prediction core itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentSummary {
    pub avg_sentiment: f64,
    pub total_articles: usize,
    pub avg_confidence: f64,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub window_hours: u32,
}

impl SentimentSummary {
    /// A summary with no articles at all, for tickers without news coverage.
    pub fn empty(window_hours: u32) -> Self {
        Self {
            avg_sentiment: 0.0,
            total_articles: 0,
            avg_confidence: 0.0,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            window_hours,
        }
    }
}

/// Pluggable text classifier behind the sentiment aggregation layer.
///
/// The blender only ever sees the aggregated `SentimentSummary`, so its
/// behavior must be identical whether a real model or a keyword heuristic
/// sits behind this trait.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> SentimentScore;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_thresholds() {
        assert_eq!(SentimentLabel::from_score(0.7), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.7), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.1), SentimentLabel::Neutral);
    }
}
