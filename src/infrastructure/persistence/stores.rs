use crate::domain::market::PricePoint;
use crate::domain::ports::{MarketStore, PredictionStore};
use crate::domain::prediction::PredictionRecord;
use crate::domain::sentiment::SentimentSummary;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// SQLite implementation of the price/news read side.
///
/// The write methods exist for the ingestion jobs (and tests); the
/// prediction core itself only reads.
pub struct SqliteMarketStore {
    pool: SqlitePool,
}

impl SqliteMarketStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_price(&self, point: &PricePoint) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_prices (ticker, open, high, low, close, volume, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&point.ticker)
        .bind(point.open)
        .bind(point.high)
        .bind(point.low)
        .bind(point.close)
        .bind(point.volume)
        .bind(point.timestamp.timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to insert price point")?;
        Ok(())
    }

    pub async fn insert_sentiment(
        &self,
        ticker: &str,
        score: f64,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO news_sentiment (ticker, score, confidence, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(ticker)
        .bind(score)
        .bind(confidence)
        .bind(timestamp.timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to insert sentiment row")?;
        Ok(())
    }
}

#[async_trait]
impl MarketStore for SqliteMarketStore {
    async fn price_history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<PricePoint>> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let rows = sqlx::query(
            r#"
            SELECT ticker, open, high, low, close, volume, timestamp
            FROM stock_prices
            WHERE ticker = ? AND timestamp BETWEEN ? AND ?
            ORDER BY timestamp ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(ticker)
        .bind(start.timestamp())
        .bind(end.timestamp())
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch price history")?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let ts: i64 = row.try_get("timestamp")?;
            points.push(PricePoint {
                ticker: row.try_get("ticker")?,
                open: row.try_get("open")?,
                high: row.try_get("high")?,
                low: row.try_get("low")?,
                close: row.try_get("close")?,
                volume: row.try_get("volume")?,
                timestamp: DateTime::from_timestamp(ts, 0).unwrap_or_default(),
            });
        }

        debug!("Fetched {} price points for {}", points.len(), ticker);
        Ok(points)
    }

    async fn sentiment_summary(&self, ticker: &str, window_hours: u32) -> Result<SentimentSummary> {
        let since = (Utc::now() - TimeDelta::hours(window_hours as i64)).timestamp();

        let row = sqlx::query(
            r#"
            SELECT
                AVG(score) AS avg_sentiment,
                COUNT(*) AS total_articles,
                AVG(confidence) AS avg_confidence,
                SUM(score > 0.1) AS positive_count,
                SUM(score < -0.1) AS negative_count,
                SUM(score BETWEEN -0.1 AND 0.1) AS neutral_count
            FROM news_sentiment
            WHERE ticker = ? AND timestamp >= ?
            "#,
        )
        .bind(ticker)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("Failed to aggregate sentiment")?;

        let total: i64 = row.try_get("total_articles")?;
        if total == 0 {
            return Ok(SentimentSummary::empty(window_hours));
        }

        Ok(SentimentSummary {
            avg_sentiment: row.try_get::<Option<f64>, _>("avg_sentiment")?.unwrap_or(0.0),
            total_articles: total as usize,
            avg_confidence: row.try_get::<Option<f64>, _>("avg_confidence")?.unwrap_or(0.0),
            positive_count: row.try_get::<Option<i64>, _>("positive_count")?.unwrap_or(0) as usize,
            negative_count: row.try_get::<Option<i64>, _>("negative_count")?.unwrap_or(0) as usize,
            neutral_count: row.try_get::<Option<i64>, _>("neutral_count")?.unwrap_or(0) as usize,
            window_hours,
        })
    }
}

/// SQLite implementation of prediction persistence. Records are stored as
/// their JSON form so the full breakdown survives schema-free.
pub struct SqlitePredictionStore {
    pool: SqlitePool,
}

impl SqlitePredictionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionStore for SqlitePredictionStore {
    async fn latest_prediction(&self, ticker: &str) -> Result<Option<PredictionRecord>> {
        let row = sqlx::query(
            "SELECT record_json FROM predictions WHERE ticker = ? ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest prediction")?;

        match row {
            Some(row) => {
                let json: String = row.try_get("record_json")?;
                let record = serde_json::from_str(&json)
                    .context("Failed to decode stored prediction record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn put_prediction(&self, ticker: &str, record: &PredictionRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to encode prediction record")?;

        sqlx::query("INSERT INTO predictions (ticker, record_json, timestamp) VALUES (?, ?, ?)")
            .bind(ticker)
            .bind(json)
            .bind(record.timestamp.timestamp())
            .execute(&self.pool)
            .await
            .context("Failed to persist prediction")?;

        debug!("Persisted prediction for {}", ticker);
        Ok(())
    }
}
