use crate::domain::sentiment::{SentimentClassifier, SentimentLabel, SentimentSummary};
use std::sync::Arc;
use tracing::debug;

/// Batch layer that folds many per-article classifications into the single
/// summary the blender consumes. Which classifier sits behind the trait is
/// invisible past this point.
pub struct SentimentAggregator {
    classifier: Arc<dyn SentimentClassifier>,
}

impl SentimentAggregator {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self { classifier }
    }

    pub fn summarize(&self, texts: &[String], window_hours: u32) -> SentimentSummary {
        if texts.is_empty() {
            return SentimentSummary::empty(window_hours);
        }

        let mut score_sum = 0.0;
        let mut confidence_sum = 0.0;
        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut neutral = 0usize;

        for text in texts {
            let result = self.classifier.classify(text);
            score_sum += result.score;
            confidence_sum += result.confidence;

            match SentimentLabel::from_score(result.score) {
                SentimentLabel::Positive => positive += 1,
                SentimentLabel::Negative => negative += 1,
                SentimentLabel::Neutral => neutral += 1,
            }
        }

        let n = texts.len() as f64;
        let summary = SentimentSummary {
            avg_sentiment: score_sum / n,
            total_articles: texts.len(),
            avg_confidence: confidence_sum / n,
            positive_count: positive,
            negative_count: negative,
            neutral_count: neutral,
            window_hours,
        };

        debug!(
            "Aggregated {} articles: avg_sentiment={:.3}, avg_confidence={:.3}",
            summary.total_articles, summary.avg_sentiment, summary.avg_confidence
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::SentimentScore;

    struct FixedClassifier {
        score: f64,
        confidence: f64,
    }

    impl SentimentClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> SentimentScore {
            SentimentScore {
                label: SentimentLabel::from_score(self.score),
                score: self.score,
                confidence: self.confidence,
            }
        }
    }

    #[test]
    fn empty_batch_yields_empty_summary() {
        let agg = SentimentAggregator::new(Arc::new(FixedClassifier {
            score: 0.7,
            confidence: 0.6,
        }));

        let summary = agg.summarize(&[], 24);
        assert_eq!(summary, SentimentSummary::empty(24));
    }

    #[test]
    fn averages_and_counts() {
        let agg = SentimentAggregator::new(Arc::new(FixedClassifier {
            score: 0.7,
            confidence: 0.6,
        }));

        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let summary = agg.summarize(&texts, 24);

        assert_eq!(summary.total_articles, 3);
        assert_eq!(summary.positive_count, 3);
        assert_eq!(summary.negative_count, 0);
        assert!((summary.avg_sentiment - 0.7).abs() < 1e-12);
        assert!((summary.avg_confidence - 0.6).abs() < 1e-12);
        assert_eq!(summary.window_hours, 24);
    }
}
