use std::sync::Arc;

use async_trait::async_trait;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    CounterOptions, CounterValue, DEFAULT_COUNTER_SEGMENT, is_counter_scope_token,
    is_counter_segment_token,
};

/// Repository port for named sequence counters.
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Atomically advances the `(scope, segment)` counter and returns the new value.
    ///
    /// The first call yields `initial_value + step`. A value beyond `max_value`
    /// fails with [`AppError::Exhausted`] and leaves the counter unchanged.
    async fn next_value(
        &self,
        scope: &str,
        segment: &str,
        options: &CounterOptions,
    ) -> AppResult<i64>;
}

/// Application service handing out formatted counter values.
#[derive(Clone)]
pub struct CounterService {
    repository: Arc<dyn CounterRepository>,
}

impl CounterService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CounterRepository>) -> Self {
        Self { repository }
    }

    /// Advances a counter and formats the result.
    ///
    /// A blank segment uses [`DEFAULT_COUNTER_SEGMENT`].
    pub async fn next(
        &self,
        scope: &str,
        segment: Option<&str>,
        options: &CounterOptions,
    ) -> AppResult<CounterValue> {
        let scope = scope.trim();
        if !is_counter_scope_token(scope) {
            return Err(AppError::Validation(format!(
                "counter scope '{scope}' is invalid"
            )));
        }

        let segment = match segment.map(str::trim) {
            Some("") | None => DEFAULT_COUNTER_SEGMENT,
            Some(segment) => segment,
        };
        if !is_counter_segment_token(segment) {
            return Err(AppError::Validation(format!(
                "counter segment '{segment}' is invalid"
            )));
        }

        let value = self.repository.next_value(scope, segment, options).await?;
        Ok(CounterValue {
            value,
            formatted: options.format(value),
        })
    }
}
