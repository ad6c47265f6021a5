use crate::application::ml::SequencePredictor;
use crate::domain::errors::PredictionError;
use crate::domain::prediction::{ComponentBreakdown, PredictionRecord, Trend};
use crate::domain::sentiment::SentimentSummary;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

/// Fixed linear-combination weights for the two signals.
#[derive(Debug, Clone, Copy)]
pub struct EnsembleWeights {
    pub model: f64,
    pub sentiment: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            model: 0.6,
            sentiment: 0.4,
        }
    }
}

/// The ordered degradation ladder. Tiers are tried in order until one
/// produces a record; the minimal tier always does.
const LADDER: [BlendTier; 3] = [
    BlendTier::FullEnsemble,
    BlendTier::TrendFallback,
    BlendTier::MinimalFallback,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlendTier {
    FullEnsemble,
    TrendFallback,
    MinimalFallback,
}

/// Blends the sequence model's estimate with aggregated news sentiment into
/// a final price prediction, trend label, and overall confidence.
///
/// Pure computation, no I/O. Never propagates a failure: every call
/// terminates with a well-formed `PredictionRecord`, possibly degraded.
pub struct EnsembleBlender {
    predictor: Arc<dyn SequencePredictor>,
    weights: EnsembleWeights,
    model_version: String,
}

const SENTIMENT_SCALE: f64 = 0.02;
const FALLBACK_SENTIMENT_SCALE: f64 = 0.01;
const VOLUME_SATURATION: f64 = 10.0;

impl EnsembleBlender {
    pub fn new(predictor: Arc<dyn SequencePredictor>) -> Self {
        Self::with_weights(predictor, EnsembleWeights::default())
    }

    pub fn with_weights(predictor: Arc<dyn SequencePredictor>, weights: EnsembleWeights) -> Self {
        Self {
            predictor,
            weights,
            model_version: "1.0.0".to_string(),
        }
    }

    /// Produce a prediction for `ticker` from an ordered close series and an
    /// optional sentiment summary, walking the degradation ladder as needed.
    pub fn predict(
        &self,
        ticker: &str,
        closes: &[f64],
        sentiment: Option<&SentimentSummary>,
        days_ahead: u32,
    ) -> PredictionRecord {
        for tier in LADDER {
            match self.run_tier(tier, ticker, closes, sentiment, days_ahead) {
                Ok(Some(record)) => return record,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Blend tier {:?} failed for {}: {}", tier, ticker, e);
                    continue;
                }
            }
        }

        // Unreachable: the minimal tier is infallible. Kept as a terminator
        // so the ladder loop stays total.
        self.minimal_fallback(ticker, days_ahead)
    }

    fn run_tier(
        &self,
        tier: BlendTier,
        ticker: &str,
        closes: &[f64],
        sentiment: Option<&SentimentSummary>,
        days_ahead: u32,
    ) -> Result<Option<PredictionRecord>, PredictionError> {
        match tier {
            BlendTier::FullEnsemble => self
                .full_ensemble(ticker, closes, sentiment, days_ahead)
                .map(Some),
            BlendTier::TrendFallback => {
                Ok(self.trend_fallback(ticker, closes, sentiment, days_ahead))
            }
            BlendTier::MinimalFallback => Ok(Some(self.minimal_fallback(ticker, days_ahead))),
        }
    }

    fn full_ensemble(
        &self,
        ticker: &str,
        closes: &[f64],
        sentiment: Option<&SentimentSummary>,
        days_ahead: u32,
    ) -> Result<PredictionRecord, PredictionError> {
        if closes.len() < 2 {
            return Err(PredictionError::InsufficientHistory {
                ticker: ticker.to_string(),
                got: closes.len(),
                need: 2,
            });
        }

        let estimates = self.predictor.predict(closes, days_ahead as usize)?;
        let base_prediction =
            *estimates
                .last()
                .ok_or_else(|| PredictionError::NumericFailure {
                    ticker: ticker.to_string(),
                    reason: "predictor returned no estimates".to_string(),
                })?;

        let model_confidence = model_confidence(closes);
        let (sentiment_adjustment, sentiment_confidence) = sentiment_adjustment(sentiment);

        let sentiment_adjusted = base_prediction * (1.0 + sentiment_adjustment);
        let predicted_price =
            self.weights.model * base_prediction + self.weights.sentiment * sentiment_adjusted;
        let confidence =
            self.weights.model * model_confidence + self.weights.sentiment * sentiment_confidence;

        let current_price = closes[closes.len() - 1];
        let price_change = predicted_price - current_price;

        if !predicted_price.is_finite() || !price_change.is_finite() || current_price == 0.0 {
            return Err(PredictionError::NumericFailure {
                ticker: ticker.to_string(),
                reason: format!("non-finite blend output (current={})", current_price),
            });
        }

        Ok(PredictionRecord {
            ticker: ticker.to_string(),
            predicted_price,
            confidence,
            base_prediction,
            sentiment_adjustment,
            sentiment_score: sentiment.map(|s| s.avg_sentiment).unwrap_or(0.0),
            trend: Trend::from_change(price_change),
            price_change,
            price_change_percent: price_change / current_price * 100.0,
            component_breakdown: ComponentBreakdown {
                model_weight: self.weights.model,
                sentiment_weight: self.weights.sentiment,
                model_confidence,
                sentiment_confidence,
            },
            model_version: self.model_version.clone(),
            timestamp: Utc::now(),
            days_ahead,
            data_points_used: closes.len(),
            degraded: false,
            error: None,
            source: None,
        })
    }

    /// Heuristic tier: extrapolate half of the most recent delta and apply a
    /// reduced sentiment term. Used whenever the full ensemble fails but at
    /// least one price is known.
    fn trend_fallback(
        &self,
        ticker: &str,
        closes: &[f64],
        sentiment: Option<&SentimentSummary>,
        days_ahead: u32,
    ) -> Option<PredictionRecord> {
        let current_price = *closes.last()?;
        if current_price == 0.0 || !current_price.is_finite() {
            // no usable base to extrapolate from; let the minimal tier close out
            return None;
        }

        let base_prediction = if closes.len() > 1 {
            current_price + 0.5 * (current_price - closes[closes.len() - 2])
        } else {
            current_price * 1.001
        };

        let sentiment_score = sentiment.map(|s| s.avg_sentiment).unwrap_or(0.0);
        let sentiment_adjustment = sentiment_score * FALLBACK_SENTIMENT_SCALE;
        let predicted_price = base_prediction * (1.0 + sentiment_adjustment);
        let price_change = predicted_price - current_price;

        if !predicted_price.is_finite() || !price_change.is_finite() {
            return None;
        }

        Some(PredictionRecord {
            ticker: ticker.to_string(),
            predicted_price,
            confidence: 0.4,
            base_prediction,
            sentiment_adjustment,
            sentiment_score,
            trend: Trend::from_change(price_change),
            price_change,
            price_change_percent: price_change / current_price * 100.0,
            component_breakdown: ComponentBreakdown {
                model_weight: 0.8,
                sentiment_weight: 0.2,
                model_confidence: 0.4,
                sentiment_confidence: 0.3,
            },
            model_version: format!("{}-fallback", self.model_version),
            timestamp: Utc::now(),
            days_ahead,
            data_points_used: closes.len(),
            degraded: true,
            error: None,
            source: None,
        })
    }

    /// Terminal tier: fixed neutral record when no price data exists at all.
    fn minimal_fallback(&self, ticker: &str, days_ahead: u32) -> PredictionRecord {
        PredictionRecord {
            ticker: ticker.to_string(),
            predicted_price: 100.0,
            confidence: 0.1,
            base_prediction: 100.0,
            sentiment_adjustment: 0.0,
            sentiment_score: 0.0,
            trend: Trend::Flat,
            price_change: 0.0,
            price_change_percent: 0.0,
            component_breakdown: ComponentBreakdown {
                model_weight: 1.0,
                sentiment_weight: 0.0,
                model_confidence: 0.1,
                sentiment_confidence: 0.1,
            },
            model_version: format!("{}-minimal-fallback", self.model_version),
            timestamp: Utc::now(),
            days_ahead,
            data_points_used: 0,
            degraded: true,
            error: Some("insufficient data for prediction".to_string()),
            source: None,
        }
    }
}

/// Confidence in the sequence model's estimate, from price action alone.
///
/// Blends return volatility against the directional consistency of the last
/// ten points, clamped to [0.3, 0.95]. Histories under ten points get a
/// fixed neutral 0.5.
pub fn model_confidence(closes: &[f64]) -> f64 {
    if closes.len() < 10 {
        return 0.5;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    let volatility = population_stddev(&returns);

    let volatility_confidence = (1.0 - volatility * 10.0).max(0.3);
    let consistency = trend_consistency(closes);

    (0.7 * volatility_confidence + 0.3 * consistency).clamp(0.3, 0.95)
}

/// Fraction of direction-sign changes over the last ten points, inverted.
/// 1.0 = monotone run, 0.0 = alternating every step.
fn trend_consistency(closes: &[f64]) -> f64 {
    if closes.len() < 5 {
        return 0.5;
    }

    let recent = &closes[closes.len().saturating_sub(10)..];
    let signs: Vec<i8> = recent.windows(2).map(|w| sign(w[1] - w[0])).collect();
    let changes = signs.windows(2).filter(|s| s[0] != s[1]).count();

    let max_possible = recent.len() - 2;
    if max_possible == 0 {
        return 0.5;
    }

    (1.0 - changes as f64 / max_possible as f64).clamp(0.0, 1.0)
}

fn sign(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sentiment contribution to the blend: a signed fractional price delta and
/// a confidence. A missing summary or one with zero articles contributes
/// nothing at neutral confidence.
pub fn sentiment_adjustment(summary: Option<&SentimentSummary>) -> (f64, f64) {
    let Some(s) = summary.filter(|s| s.total_articles > 0) else {
        return (0.0, 0.5);
    };

    let volume_factor = (s.total_articles as f64 / VOLUME_SATURATION).min(1.0);
    let adjustment = s.avg_sentiment * SENTIMENT_SCALE * volume_factor;
    let confidence = (0.6 * volume_factor + 0.4 * s.avg_confidence).min(0.9);

    (adjustment, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic predictor that echoes the last close.
    struct EchoPredictor;

    impl SequencePredictor for EchoPredictor {
        fn predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, PredictionError> {
            if horizon == 0 {
                return Err(PredictionError::InvalidHorizon { horizon });
            }
            let last = history.last().copied().unwrap_or(100.0);
            Ok(vec![last; horizon])
        }

        fn name(&self) -> &str {
            "Echo"
        }

        fn version(&self) -> &str {
            "test"
        }
    }

    fn blender() -> EnsembleBlender {
        EnsembleBlender::new(Arc::new(EchoPredictor))
    }

    fn summary(avg_sentiment: f64, total_articles: usize, avg_confidence: f64) -> SentimentSummary {
        SentimentSummary {
            avg_sentiment,
            total_articles,
            avg_confidence,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            window_hours: 24,
        }
    }

    #[test]
    fn constant_price_confidence_caps_at_095() {
        let closes = vec![50.0; 20];
        assert_eq!(model_confidence(&closes), 0.95);
    }

    #[test]
    fn short_history_confidence_is_neutral() {
        assert_eq!(model_confidence(&[100.0, 101.0, 102.0]), 0.5);
    }

    #[test]
    fn confidence_stays_in_band() {
        // violently alternating series
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 150.0 })
            .collect();
        let c = model_confidence(&closes);
        assert!((0.3..=0.95).contains(&c), "got {}", c);
    }

    #[test]
    fn zero_articles_is_neutral_sentiment() {
        let (adj, conf) = sentiment_adjustment(Some(&summary(0.9, 0, 0.9)));
        assert_eq!(adj, 0.0);
        assert_eq!(conf, 0.5);

        let (adj, conf) = sentiment_adjustment(None);
        assert_eq!(adj, 0.0);
        assert_eq!(conf, 0.5);
    }

    #[test]
    fn sentiment_adjustment_scales_with_volume() {
        let (adj, conf) = sentiment_adjustment(Some(&summary(0.5, 5, 0.8)));
        assert!((adj - 0.5 * 0.02 * 0.5).abs() < 1e-12);
        assert!((conf - (0.6 * 0.5 + 0.4 * 0.8)).abs() < 1e-12);

        // volume factor saturates at 10 articles, confidence caps at 0.9
        let (adj, conf) = sentiment_adjustment(Some(&summary(1.0, 50, 1.0)));
        assert!((adj - 0.02).abs() < 1e-12);
        assert_eq!(conf, 0.9);
    }

    #[test]
    fn constant_price_and_no_sentiment_is_flat() {
        let closes = vec![50.0; 20];
        let record = blender().predict("AAPL", &closes, None, 1);

        assert!(!record.degraded);
        assert_eq!(record.trend, Trend::Flat);
        assert_eq!(record.sentiment_adjustment, 0.0);
        assert_eq!(record.component_breakdown.model_confidence, 0.95);
    }

    #[test]
    fn weights_sum_to_one_and_blend_is_linear() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.5).collect();
        let record = blender().predict("AAPL", &closes, Some(&summary(0.5, 10, 0.8)), 1);

        assert!(!record.degraded);
        let b = record.component_breakdown;
        assert_eq!(b.model_weight + b.sentiment_weight, 1.0);

        let reconstructed = b.model_weight * record.base_prediction
            + b.sentiment_weight * record.base_prediction * (1.0 + record.sentiment_adjustment);
        assert!((record.predicted_price - reconstructed).abs() < 1e-9);
    }

    #[test]
    fn noisy_uptrend_with_positive_sentiment_predicts_up() {
        // strictly noisy uptrend, 30+ points
        let closes: Vec<f64> = (0..32)
            .map(|i| 100.0 + i as f64 * 0.6 + if i % 2 == 0 { -0.2 } else { 0.2 })
            .collect();
        let record = blender().predict("AAPL", &closes, Some(&summary(0.5, 10, 0.8)), 1);

        assert!(!record.degraded);
        assert_eq!(record.trend, Trend::Up);
        assert!((0.3..=0.95).contains(&record.confidence), "{}", record.confidence);
    }

    #[test]
    fn empty_history_hits_minimal_fallback() {
        let record = blender().predict("AAPL", &[], Some(&summary(0.5, 10, 0.8)), 1);

        assert!(record.degraded);
        assert_eq!(record.predicted_price, 100.0);
        assert_eq!(record.confidence, 0.1);
        assert_eq!(record.trend, Trend::Flat);
        assert!(record.model_version.ends_with("-minimal-fallback"));
        assert!(record.error.is_some());
    }

    #[test]
    fn single_point_history_hits_trend_fallback() {
        let record = blender().predict("AAPL", &[200.0], Some(&summary(0.5, 10, 0.8)), 1);

        assert!(record.degraded);
        assert!(record.model_version.ends_with("-fallback"));
        assert!(!record.model_version.contains("minimal"));

        let expected = 200.0 * 1.001 * (1.0 + 0.5 * 0.01);
        assert!((record.predicted_price - expected).abs() < 1e-9);
        assert_eq!(record.confidence, 0.4);
        assert_eq!(record.component_breakdown.model_weight, 0.8);
        assert_eq!(record.component_breakdown.sentiment_weight, 0.2);
    }

    #[test]
    fn fallback_trend_is_still_a_sign_function() {
        // flat two-point history with no sentiment: fallback extrapolates
        // zero delta, so the change is exactly zero
        struct FailingPredictor;
        impl SequencePredictor for FailingPredictor {
            fn predict(&self, _: &[f64], _: usize) -> Result<Vec<f64>, PredictionError> {
                Err(PredictionError::NumericFailure {
                    ticker: "X".to_string(),
                    reason: "boom".to_string(),
                })
            }
            fn name(&self) -> &str {
                "Failing"
            }
            fn version(&self) -> &str {
                "test"
            }
        }

        let blender = EnsembleBlender::new(Arc::new(FailingPredictor));
        let record = blender.predict("AAPL", &[100.0, 100.0], None, 1);

        assert!(record.degraded);
        assert_eq!(record.trend, Trend::Flat);
        assert_eq!(record.price_change, 0.0);
    }

    #[test]
    fn predictor_failure_degrades_instead_of_raising() {
        struct FailingPredictor;
        impl SequencePredictor for FailingPredictor {
            fn predict(&self, _: &[f64], _: usize) -> Result<Vec<f64>, PredictionError> {
                Err(PredictionError::NumericFailure {
                    ticker: "X".to_string(),
                    reason: "boom".to_string(),
                })
            }
            fn name(&self) -> &str {
                "Failing"
            }
            fn version(&self) -> &str {
                "test"
            }
        }

        let blender = EnsembleBlender::new(Arc::new(FailingPredictor));
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let record = blender.predict("AAPL", &closes, None, 1);

        assert!(record.degraded);
        // half the last delta extrapolated: 129 + 0.5
        assert!((record.base_prediction - 129.5).abs() < 1e-9);
    }

    #[test]
    fn zero_last_close_skips_to_minimal_fallback() {
        // a history ending in 0.0 has no usable base price; neither blend
        // tier may divide by it
        let record = blender().predict("ZERO", &[100.0, 0.0], None, 1);

        assert!(record.degraded);
        assert!(record.model_version.ends_with("-minimal-fallback"));
        assert_eq!(record.predicted_price, 100.0);
        assert_eq!(record.confidence, 0.1);
        assert!(record.predicted_price.is_finite());
        assert!(record.price_change_percent.is_finite());

        // the record must also survive the cache encoding round trip
        let bytes = serde_json::to_vec(&record).unwrap();
        let decoded: PredictionRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn non_finite_closes_skip_to_minimal_fallback() {
        let record = blender().predict("INF", &[100.0, f64::INFINITY], None, 1);

        assert!(record.degraded);
        assert!(record.model_version.ends_with("-minimal-fallback"));
        assert!(record.predicted_price.is_finite());
    }

    #[test]
    fn custom_weights_flow_through() {
        let blender = EnsembleBlender::with_weights(
            Arc::new(EchoPredictor),
            EnsembleWeights {
                model: 0.7,
                sentiment: 0.3,
            },
        );
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let record = blender.predict("AAPL", &closes, Some(&summary(1.0, 10, 1.0)), 1);

        assert_eq!(record.component_breakdown.model_weight, 0.7);
        assert_eq!(record.component_breakdown.sentiment_weight, 0.3);
    }
}
