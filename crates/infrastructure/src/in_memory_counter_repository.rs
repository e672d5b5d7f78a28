use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sealworks_application::CounterRepository;
use sealworks_core::{AppError, AppResult};
use sealworks_domain::CounterOptions;

/// In-memory counter store; each advance runs under one lock.
#[derive(Debug, Default)]
pub struct InMemoryCounterRepository {
    values: Mutex<HashMap<(String, String), i64>>,
}

impl InMemoryCounterRepository {
    /// Creates an empty counter store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterRepository for InMemoryCounterRepository {
    async fn next_value(
        &self,
        scope: &str,
        segment: &str,
        options: &CounterOptions,
    ) -> AppResult<i64> {
        let key = (scope.to_owned(), segment.to_owned());
        let mut values = self.values.lock().await;

        let current = values
            .get(&key)
            .copied()
            .unwrap_or_else(|| options.initial_value.unwrap_or(0));
        let next = current
            .checked_add(options.effective_step())
            .ok_or_else(|| AppError::Exhausted(format!("counter {scope}:{segment} overflowed")))?;
        if let Some(max_value) = options.max_value
            && next > max_value
        {
            return Err(AppError::Exhausted(format!(
                "counter {scope}:{segment} reached its maximum of {max_value}"
            )));
        }

        values.insert(key, next);
        Ok(next)
    }
}
