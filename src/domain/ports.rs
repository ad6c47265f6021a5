use crate::domain::market::PricePoint;
use crate::domain::prediction::PredictionRecord;
use crate::domain::sentiment::SentimentSummary;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

// Need async_trait for async functions in traits
/// Read side of the price/news store populated by the ingestion jobs.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Ordered price history for a ticker within [start, end], paginated.
    async fn price_history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<PricePoint>>;

    /// Aggregated news sentiment over the trailing window.
    async fn sentiment_summary(&self, ticker: &str, window_hours: u32) -> Result<SentimentSummary>;
}

/// Durable storage for prediction records.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Most recent stored record for a ticker, if any.
    async fn latest_prediction(&self, ticker: &str) -> Result<Option<PredictionRecord>>;

    async fn put_prediction(&self, ticker: &str, record: &PredictionRecord) -> Result<()>;
}

/// Fast byte-oriented cache with per-key TTL, fronting the durable store.
#[async_trait]
pub trait PredictionCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}
