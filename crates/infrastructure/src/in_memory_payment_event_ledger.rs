use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sealworks_application::PaymentEventLedger;
use sealworks_core::AppResult;

/// In-memory set of processed idempotency keys and webhook event ids.
#[derive(Debug, Default)]
pub struct InMemoryPaymentEventLedger {
    keys: Mutex<HashSet<String>>,
}

impl InMemoryPaymentEventLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentEventLedger for InMemoryPaymentEventLedger {
    async fn remember(&self, key: &str) -> AppResult<bool> {
        Ok(self.keys.lock().await.insert(key.to_owned()))
    }

    async fn release(&self, key: &str) -> AppResult<()> {
        self.keys.lock().await.remove(key);
        Ok(())
    }
}
