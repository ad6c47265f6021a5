use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. Immutable once recorded; ordered by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(ticker: impl Into<String>, close: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            timestamp,
        }
    }
}

/// Extract the ordered close series from a history, sorting by timestamp.
/// The prediction core only ever consumes closes.
pub fn close_series(history: &[PricePoint]) -> Vec<f64> {
    let mut sorted: Vec<&PricePoint> = history.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);
    sorted.iter().map(|p| p.close).collect()
}
