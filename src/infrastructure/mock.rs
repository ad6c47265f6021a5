//! In-memory mock implementations of the store ports.
//!
//! Thread-safe via `Arc<RwLock>`; intended for unit and scenario tests that
//! need deterministic collaborators, and for running the core without any
//! external store. Failure injection covers the "store unavailable" branch
//! of the degradation ladder.

use crate::domain::market::PricePoint;
use crate::domain::ports::{MarketStore, PredictionStore};
use crate::domain::prediction::PredictionRecord;
use crate::domain::sentiment::SentimentSummary;
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct MockState {
    prices: HashMap<String, Vec<PricePoint>>,
    sentiment: HashMap<String, SentimentSummary>,
    predictions: HashMap<String, Vec<PredictionRecord>>,
}

#[derive(Clone, Default)]
pub struct MockMarketStore {
    state: Arc<RwLock<MockState>>,
    unavailable: Arc<AtomicBool>,
}

impl MockMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_prices(&self, ticker: &str, points: Vec<PricePoint>) {
        self.state
            .write()
            .await
            .prices
            .insert(ticker.to_string(), points);
    }

    pub async fn seed_sentiment(&self, ticker: &str, summary: SentimentSummary) {
        self.state
            .write()
            .await
            .sentiment
            .insert(ticker.to_string(), summary);
    }

    /// Make every store call fail, simulating a collaborator outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn prediction_count(&self, ticker: &str) -> usize {
        self.state
            .read()
            .await
            .predictions
            .get(ticker)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("mock store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl MarketStore for MockMarketStore {
    async fn price_history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<PricePoint>> {
        self.check_available()?;

        let state = self.state.read().await;
        let points = state.prices.get(ticker).cloned().unwrap_or_default();

        let skip = (page.saturating_sub(1) as usize) * limit as usize;
        Ok(points
            .into_iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .skip(skip)
            .take(limit as usize)
            .collect())
    }

    async fn sentiment_summary(&self, ticker: &str, window_hours: u32) -> Result<SentimentSummary> {
        self.check_available()?;

        let state = self.state.read().await;
        Ok(state
            .sentiment
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| SentimentSummary::empty(window_hours)))
    }
}

#[async_trait]
impl PredictionStore for MockMarketStore {
    async fn latest_prediction(&self, ticker: &str) -> Result<Option<PredictionRecord>> {
        self.check_available()?;

        let state = self.state.read().await;
        Ok(state
            .predictions
            .get(ticker)
            .and_then(|v| v.last())
            .cloned())
    }

    async fn put_prediction(&self, ticker: &str, record: &PredictionRecord) -> Result<()> {
        self.check_available()?;

        self.state
            .write()
            .await
            .predictions
            .entry(ticker.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}
