use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the predicted move relative to the last observed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Trend is a pure function of the sign of the price change.
    pub fn from_change(price_change: f64) -> Self {
        if price_change > 0.0 {
            Trend::Up
        } else if price_change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}

/// Where a served record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Cache,
    Database,
    Computed,
}

/// Weights and per-signal confidences that went into the blend.
///
/// Invariant for non-degraded records: `model_weight + sentiment_weight == 1.0`
/// and `predicted_price == model_weight * base_prediction
/// + sentiment_weight * base_prediction * (1 + sentiment_adjustment)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComponentBreakdown {
    pub model_weight: f64,
    pub sentiment_weight: f64,
    pub model_confidence: f64,
    pub sentiment_confidence: f64,
}

/// The output of one prediction pass. Immutable once returned; the freshness
/// gate is the sole writer to storage and cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub ticker: String,
    pub predicted_price: f64,
    /// Overall confidence in [0, 1].
    pub confidence: f64,
    /// Pre-sentiment estimate from the sequence model.
    pub base_prediction: f64,
    /// Signed fractional delta applied for sentiment, e.g. 0.004 = +0.4%.
    pub sentiment_adjustment: f64,
    pub sentiment_score: f64,
    pub trend: Trend,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub component_breakdown: ComponentBreakdown,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
    pub days_ahead: u32,
    pub data_points_used: usize,
    /// True when a fallback strategy produced this record.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<RecordSource>,
}

impl PredictionRecord {
    /// Age-based freshness check against the staleness threshold.
    pub fn is_fresh(&self, now: DateTime<Utc>, staleness: chrono::TimeDelta) -> bool {
        now.signed_duration_since(self.timestamp) < staleness
    }
}
