//! In-memory TTL cache implementation of `PredictionCache`.
//!
//! The real deployment fronts the durable store with an external cache
//! engine owned by the collaborator layer; this thread-safe map stands in
//! behind the same trait for single-instance deployments and tests.

use crate::domain::ports::PredictionCache;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct Entry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct InMemoryTtlCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryTtlCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionCache for InMemoryTtlCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // lazily evict the expired entry
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        // absurdly long TTLs degrade to "practically forever"
        let expires_at =
            Utc::now() + TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::days(36500));

        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
