use crate::application::blender::EnsembleBlender;
use crate::domain::errors::PredictionError;
use crate::domain::market::close_series;
use crate::domain::prediction::{ComponentBreakdown, PredictionRecord, RecordSource, Trend};
use crate::domain::ports::{MarketStore, PredictionCache, PredictionStore};
use crate::domain::sentiment::SentimentSummary;
use chrono::{TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning knobs for the freshness gate.
#[derive(Debug, Clone)]
pub struct ServicePolicy {
    /// Maximum age at which a stored record may still be served.
    pub staleness: TimeDelta,
    /// Fast-cache TTL; must not exceed the staleness threshold.
    pub cache_ttl: Duration,
    /// How far back to fetch price history.
    pub history_days: i64,
    /// Minimum points required before the blender is invoked at all.
    pub min_history: usize,
    /// Trailing news window for sentiment aggregation.
    pub sentiment_window_hours: u32,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            staleness: TimeDelta::minutes(15),
            cache_ttl: Duration::from_secs(300),
            history_days: 90,
            min_history: 30,
            sentiment_window_hours: 24,
        }
    }
}

/// Rough prior prices for well-known tickers, used only by the low-data
/// heuristic record.
const KNOWN_BASE_PRICES: &[(&str, f64)] = &[
    ("AAPL", 180.0),
    ("GOOGL", 140.0),
    ("MSFT", 380.0),
    ("TSLA", 250.0),
    ("AMZN", 150.0),
    ("NVDA", 480.0),
    ("META", 320.0),
];

/// Freshness-aware gate in front of the blender: serves a cached prediction
/// while it is younger than the staleness threshold, otherwise recomputes,
/// persists, and re-caches.
///
/// Two racing callers past an expired entry may both recompute; the blend is
/// idempotent and cheap next to the I/O, so no per-ticker locking is done.
pub struct PredictionService {
    market: Arc<dyn MarketStore>,
    store: Arc<dyn PredictionStore>,
    cache: Arc<dyn PredictionCache>,
    blender: EnsembleBlender,
    policy: ServicePolicy,
    rng: Mutex<StdRng>,
}

impl PredictionService {
    pub fn new(
        market: Arc<dyn MarketStore>,
        store: Arc<dyn PredictionStore>,
        cache: Arc<dyn PredictionCache>,
        blender: EnsembleBlender,
        policy: ServicePolicy,
    ) -> Self {
        Self {
            market,
            store,
            cache,
            blender,
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic low-data heuristic for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// The single public entry point. Always returns a well-formed record
    /// for any data condition; the only error is the `days_ahead == 0`
    /// contract violation.
    pub async fn get_prediction(
        &self,
        ticker: &str,
        days_ahead: u32,
    ) -> Result<PredictionRecord, PredictionError> {
        if days_ahead == 0 {
            return Err(PredictionError::InvalidHorizon { horizon: 0 });
        }

        if let Some(record) = self.lookup_fresh(ticker).await {
            return Ok(record);
        }

        Ok(self.recompute(ticker, days_ahead).await)
    }

    /// Cache first, then durable store; anything stale or unreadable is a miss.
    async fn lookup_fresh(&self, ticker: &str) -> Option<PredictionRecord> {
        let now = Utc::now();
        let key = cache_key(ticker);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<PredictionRecord>(&bytes) {
                Ok(record) if record.is_fresh(now, self.policy.staleness) => {
                    debug!("Cache hit for {}", ticker);
                    return Some(tag(record, RecordSource::Cache));
                }
                Ok(_) => debug!("Cached prediction for {} is stale", ticker),
                Err(e) => warn!("Malformed cached prediction for {}: {}", ticker, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", ticker, e),
        }

        match self.store.latest_prediction(ticker).await {
            Ok(Some(record)) if record.is_fresh(now, self.policy.staleness) => {
                debug!("Durable-store hit for {}", ticker);
                Some(tag(record, RecordSource::Database))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Prediction store read failed for {}: {}", ticker, e);
                None
            }
        }
    }

    async fn recompute(&self, ticker: &str, days_ahead: u32) -> PredictionRecord {
        let closes = self.fetch_closes(ticker).await;

        if closes.is_empty() {
            // nothing to extrapolate from, not even a heuristic base; let
            // the ladder terminate at its minimal tier
            warn!("No price history at all for {}", ticker);
            return tag(
                self.blender.predict(ticker, &[], None, days_ahead),
                RecordSource::Computed,
            );
        }

        if closes.len() < self.policy.min_history {
            warn!(
                "Insufficient data for {}: {} points, need {}",
                ticker,
                closes.len(),
                self.policy.min_history
            );
            return self.heuristic_record(ticker, days_ahead, closes.len());
        }

        let sentiment = self.fetch_sentiment(ticker).await;
        let record = self
            .blender
            .predict(ticker, &closes, sentiment.as_ref(), days_ahead);

        if record.degraded {
            warn!("Serving degraded prediction for {}", ticker);
        } else {
            info!(
                "Computed prediction for {}: {:.2} ({})",
                ticker, record.predicted_price, record.trend
            );
        }

        self.persist(ticker, &record).await;
        tag(record, RecordSource::Computed)
    }

    async fn fetch_closes(&self, ticker: &str) -> Vec<f64> {
        let end = Utc::now();
        let start = end - TimeDelta::days(self.policy.history_days);

        match self.market.price_history(ticker, start, end, 1, 1000).await {
            Ok(history) => close_series(&history),
            Err(e) => {
                // unavailable store == missing data, same ladder
                warn!("Price history fetch failed for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    async fn fetch_sentiment(&self, ticker: &str) -> Option<SentimentSummary> {
        match self
            .market
            .sentiment_summary(ticker, self.policy.sentiment_window_hours)
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Sentiment fetch failed for {}: {}", ticker, e);
                None
            }
        }
    }

    /// Write-through: durable store first, then the fast cache with a TTL no
    /// longer than the staleness threshold. Failures are logged, not raised;
    /// the caller still gets the freshly computed record.
    async fn persist(&self, ticker: &str, record: &PredictionRecord) {
        if let Err(e) = self.store.put_prediction(ticker, record).await {
            warn!("Failed to persist prediction for {}: {}", ticker, e);
        }

        match serde_json::to_vec(record) {
            Ok(bytes) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(&cache_key(ticker), bytes, self.policy.cache_ttl)
                    .await
                {
                    warn!("Failed to cache prediction for {}: {}", ticker, e);
                }
            }
            Err(e) => warn!("Failed to encode prediction for {}: {}", ticker, e),
        }
    }

    /// Standalone degraded-shaped record for tickers without enough history
    /// to run the blender at all. Not persisted and not cached, so a later
    /// call retries against the store.
    fn heuristic_record(
        &self,
        ticker: &str,
        days_ahead: u32,
        data_points_used: usize,
    ) -> PredictionRecord {
        let base_price = KNOWN_BASE_PRICES
            .iter()
            .find(|(t, _)| *t == ticker)
            .map(|(_, p)| *p)
            .unwrap_or(100.0);

        let variation = match self.rng.lock() {
            Ok(mut rng) => rng.random_range(-0.03..=0.03),
            Err(_) => 0.0,
        };

        let predicted_price = base_price * (1.0 + variation);
        let price_change = predicted_price - base_price;

        PredictionRecord {
            ticker: ticker.to_string(),
            predicted_price,
            confidence: 0.2,
            base_prediction: predicted_price,
            sentiment_adjustment: 0.0,
            sentiment_score: 0.0,
            trend: Trend::from_change(price_change),
            price_change,
            price_change_percent: price_change / base_price * 100.0,
            component_breakdown: ComponentBreakdown {
                model_weight: 1.0,
                sentiment_weight: 0.0,
                model_confidence: 0.2,
                sentiment_confidence: 0.0,
            },
            model_version: "1.0.0-insufficient-data".to_string(),
            timestamp: Utc::now(),
            days_ahead,
            data_points_used,
            degraded: true,
            error: Some("insufficient price history".to_string()),
            source: Some(RecordSource::Computed),
        }
    }
}

fn cache_key(ticker: &str) -> String {
    format!("prediction:{}:latest", ticker)
}

fn tag(mut record: PredictionRecord, source: RecordSource) -> PredictionRecord {
    record.source = Some(source);
    record
}
