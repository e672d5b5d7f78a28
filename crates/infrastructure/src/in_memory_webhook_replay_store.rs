use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use sealworks_application::WebhookReplayStore;
use sealworks_core::{AppError, AppResult};

/// Process-local replay store. Expired entries are pruned on every write.
#[derive(Debug, Default)]
pub struct InMemoryWebhookReplayStore {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryWebhookReplayStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn record_at(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::Validation("replay key is required".to_owned()));
        }
        if expires_at < now {
            return Err(AppError::Validation(
                "replay expiry is in the past".to_owned(),
            ));
        }

        let mut entries = self.entries.lock().await;
        entries.retain(|_, expiry| *expiry >= now);
        if entries.get(key).is_some_and(|expiry| *expiry > now) {
            return Ok(false);
        }
        entries.insert(key.to_owned(), expires_at);
        Ok(true)
    }
}

#[async_trait]
impl WebhookReplayStore for InMemoryWebhookReplayStore {
    async fn record(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<bool> {
        self.record_at(key, expires_at, Utc::now()).await
    }
}
