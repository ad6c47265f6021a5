//! Configuration module for stockcast.
//!
//! Structured configuration loading from environment variables, covering the
//! blend weights, freshness policy, and store location.

use crate::application::blender::EnsembleWeights;
use crate::application::service::ServicePolicy;
use anyhow::{Context, Result, ensure};
use chrono::TimeDelta;
use std::env;
use std::time::Duration;

/// Environment-driven configuration for the prediction core.
#[derive(Debug, Clone)]
pub struct PredictionEnvConfig {
    pub database_url: String,
    pub staleness_minutes: i64,
    pub cache_ttl_seconds: u64,
    pub history_days: i64,
    pub min_history: usize,
    pub lookback: usize,
    pub model_weight: f64,
    pub sentiment_weight: f64,
    pub sentiment_window_hours: u32,
}

impl Default for PredictionEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/stockcast.db".to_string(),
            staleness_minutes: 15,
            cache_ttl_seconds: 300,
            history_days: 90,
            min_history: 30,
            lookback: 60,
            model_weight: 0.6,
            sentiment_weight: 0.4,
            sentiment_window_hours: 24,
        }
    }
}

impl PredictionEnvConfig {
    /// Load configuration from the environment (with `.env` support),
    /// falling back to the documented defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            staleness_minutes: parse_env("STALENESS_MINUTES", defaults.staleness_minutes)?,
            cache_ttl_seconds: parse_env("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
            history_days: parse_env("HISTORY_DAYS", defaults.history_days)?,
            min_history: parse_env("MIN_HISTORY_POINTS", defaults.min_history)?,
            lookback: parse_env("MODEL_LOOKBACK", defaults.lookback)?,
            model_weight: parse_env("MODEL_WEIGHT", defaults.model_weight)?,
            sentiment_weight: parse_env("SENTIMENT_WEIGHT", defaults.sentiment_weight)?,
            sentiment_window_hours: parse_env(
                "SENTIMENT_WINDOW_HOURS",
                defaults.sentiment_window_hours,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (self.model_weight + self.sentiment_weight - 1.0).abs() < 1e-9,
            "MODEL_WEIGHT + SENTIMENT_WEIGHT must equal 1.0 (got {} + {})",
            self.model_weight,
            self.sentiment_weight
        );
        ensure!(
            self.cache_ttl_seconds as i64 <= self.staleness_minutes * 60,
            "CACHE_TTL_SECONDS ({}) must not exceed the staleness threshold ({}s)",
            self.cache_ttl_seconds,
            self.staleness_minutes * 60
        );
        ensure!(self.staleness_minutes > 0, "STALENESS_MINUTES must be > 0");
        ensure!(self.min_history > 0, "MIN_HISTORY_POINTS must be > 0");
        Ok(())
    }

    pub fn weights(&self) -> EnsembleWeights {
        EnsembleWeights {
            model: self.model_weight,
            sentiment: self.sentiment_weight,
        }
    }

    pub fn policy(&self) -> ServicePolicy {
        ServicePolicy {
            staleness: TimeDelta::minutes(self.staleness_minutes),
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            history_days: self.history_days,
            min_history: self.min_history,
            sentiment_window_hours: self.sentiment_window_hours,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, value)),
        Err(_) => Ok(default),
    }
}
