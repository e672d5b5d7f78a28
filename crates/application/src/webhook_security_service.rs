//! Replay protection and outcome metrics for signed webhook deliveries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use sealworks_core::{AppError, AppResult};

/// How long a signed delivery is remembered when no TTL is configured.
pub const DEFAULT_REPLAY_TTL_SECONDS: i64 = 300;

/// Port remembering recently seen signed deliveries.
#[async_trait]
pub trait WebhookReplayStore: Send + Sync {
    /// Remembers `key` until `expires_at`.
    ///
    /// Returns `false` when an unexpired entry for `key` already exists.
    async fn record(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<bool>;
}

/// Port for an external webhook outcome metric sink.
#[async_trait]
pub trait WebhookMetricsRecorder: Send + Sync {
    /// Records how one webhook request ended and how long it took.
    async fn record_webhook_outcome(
        &self,
        source: &str,
        outcome: &str,
        elapsed: std::time::Duration,
    ) -> AppResult<()>;
}

/// Signature material identifying one signed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDelivery {
    /// Verified signature as sent by the caller.
    pub signature: String,
    /// Time the sender signed the payload.
    ///
    /// Senders that sign no timestamp use [`DateTime::UNIX_EPOCH`], so the
    /// signature and path alone identify the delivery.
    pub signed_at: DateTime<Utc>,
    /// Request path the delivery arrived on.
    pub path: String,
}

impl SignedDelivery {
    /// Key under which the delivery is remembered.
    #[must_use]
    pub fn replay_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.signature.trim(),
            self.signed_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.path.trim().to_ascii_lowercase()
        )
    }

    /// Short digest of the signature, safe to log.
    #[must_use]
    pub fn signature_hash(&self) -> String {
        let digest = Sha256::digest(self.signature.as_bytes());
        hex::encode(&digest[..8])
    }
}

/// Rejects signed deliveries that were already accepted within the TTL.
#[derive(Clone)]
pub struct WebhookReplayGuard {
    store: Arc<dyn WebhookReplayStore>,
    ttl: Duration,
}

impl WebhookReplayGuard {
    /// Creates a guard remembering deliveries for five minutes.
    #[must_use]
    pub fn new(store: Arc<dyn WebhookReplayStore>) -> Self {
        Self {
            store,
            ttl: Duration::seconds(DEFAULT_REPLAY_TTL_SECONDS),
        }
    }

    /// Overrides the TTL. Non-positive values keep the default.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        if ttl > Duration::zero() {
            self.ttl = ttl;
        }
        self
    }

    /// Records `delivery`, failing when it was seen before.
    ///
    /// Duplicates are [`AppError::Conflict`]; store failures are
    /// [`AppError::Unavailable`].
    pub async fn admit(&self, delivery: &SignedDelivery, now: DateTime<Utc>) -> AppResult<()> {
        let mut expires_at = delivery.signed_at + self.ttl;
        if expires_at < now {
            expires_at = now + self.ttl;
        }

        let stored = self
            .store
            .record(&delivery.replay_key(), expires_at)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("webhook replay store failed: {error}"))
            })?;
        if !stored {
            return Err(AppError::Conflict(format!(
                "webhook delivery {} was already processed",
                delivery.signature_hash()
            )));
        }

        Ok(())
    }
}
