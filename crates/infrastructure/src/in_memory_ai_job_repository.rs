use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use sealworks_application::AiJobRepository;
use sealworks_core::{AppError, AppResult};
use sealworks_domain::{AiJob, AiSuggestion};

/// In-memory store for AI jobs and generated suggestions.
#[derive(Debug, Default)]
pub struct InMemoryAiJobRepository {
    jobs: RwLock<HashMap<String, AiJob>>,
    suggestions: RwLock<HashMap<String, AiSuggestion>>,
}

impl InMemoryAiJobRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an enqueued job.
    pub async fn insert_job(&self, job: AiJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    /// Loads a stored suggestion.
    pub async fn find_suggestion(&self, suggestion_id: &str) -> Option<AiSuggestion> {
        self.suggestions.read().await.get(suggestion_id).cloned()
    }
}

#[async_trait]
impl AiJobRepository for InMemoryAiJobRepository {
    async fn find_job(&self, job_id: &str) -> AppResult<Option<AiJob>> {
        Ok(self.jobs.read().await.get(job_id).cloned())
    }

    async fn save_job(&self, job: AiJob) -> AppResult<AiJob> {
        let mut jobs = self.jobs.write().await;
        let Some(stored) = jobs.get_mut(&job.id) else {
            return Err(AppError::NotFound(format!("ai job '{}' not found", job.id)));
        };

        *stored = job.clone();
        Ok(job)
    }

    async fn save_suggestion(&self, suggestion: AiSuggestion) -> AppResult<AiSuggestion> {
        self.suggestions
            .write()
            .await
            .insert(suggestion.id.clone(), suggestion.clone());
        Ok(suggestion)
    }
}
