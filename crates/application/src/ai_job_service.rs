use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    AiCompletionResult, AiJob, AiJobCompletion, AiJobStatus, AiSuggestion,
    SuggestionReadyNotification,
};

/// Suggestion status stored when the worker does not report one.
pub const DEFAULT_SUGGESTION_STATUS: &str = "proposed";

/// Repository port for AI jobs and the suggestions they produce.
#[async_trait]
pub trait AiJobRepository: Send + Sync {
    /// Loads one job.
    async fn find_job(&self, job_id: &str) -> AppResult<Option<AiJob>>;

    /// Replaces a stored job.
    async fn save_job(&self, job: AiJob) -> AppResult<AiJob>;

    /// Stores or replaces a suggestion.
    async fn save_suggestion(&self, suggestion: AiSuggestion) -> AppResult<AiSuggestion>;
}

/// Port notifying downstream consumers that a suggestion is ready.
#[async_trait]
pub trait AiSuggestionNotifier: Send + Sync {
    /// Delivers one notification.
    async fn notify_suggestion_ready(
        &self,
        notification: SuggestionReadyNotification,
    ) -> AppResult<()>;
}

/// Application service closing out asynchronous AI jobs.
#[derive(Clone)]
pub struct AiJobService {
    repository: Arc<dyn AiJobRepository>,
    notifier: Option<Arc<dyn AiSuggestionNotifier>>,
}

impl AiJobService {
    /// Creates a service without a notifier.
    #[must_use]
    pub fn new(repository: Arc<dyn AiJobRepository>) -> Self {
        Self {
            repository,
            notifier: None,
        }
    }

    /// Sends a notification for every newly stored suggestion.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn AiSuggestionNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Applies a worker callback to its job.
    ///
    /// Completing an already finished job is a no-op that returns the stored
    /// job without a suggestion. Notification failures are logged only.
    pub async fn complete(&self, completion: AiJobCompletion) -> AppResult<AiCompletionResult> {
        let job_id = completion.job_id.trim();
        if job_id.is_empty() {
            return Err(AppError::Validation("jobId is required".to_owned()));
        }
        if completion.suggestion.is_none() && completion.error.is_none() {
            return Err(AppError::Validation(
                "either a suggestion or error details are required".to_owned(),
            ));
        }

        let mut job = self
            .repository
            .find_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("ai job '{job_id}' not found")))?;

        if job.status.is_terminal() {
            tracing::debug!(job_id = %job.id, status = %job.status, "ai job already completed");
            return Ok(AiCompletionResult {
                job,
                suggestion: None,
            });
        }

        let now = Utc::now();
        let suggestion = match (completion.error, completion.suggestion) {
            (Some(error), _) => {
                job.status = AiJobStatus::Failed;
                job.error = Some(error);
                None
            }
            (None, Some(suggestion)) => {
                let suggestion = self.store_suggestion(&job, suggestion, now).await?;
                job.status = AiJobStatus::Succeeded;
                job.error = None;
                job.suggestion_id = Some(suggestion.id.clone());
                Some(suggestion)
            }
            (None, None) => None,
        };

        job.outputs = completion.outputs;
        job.metadata = completion.metadata;
        job.completed_at = Some(now);
        job.updated_at = now;
        let job = self.repository.save_job(job).await?;

        if let (Some(notifier), Some(suggestion)) = (&self.notifier, &suggestion) {
            let notification = SuggestionReadyNotification::build(
                &job,
                suggestion,
                &job.outputs,
                &job.metadata,
                now,
            );
            if let Err(error) = notifier.notify_suggestion_ready(notification).await {
                tracing::warn!(
                    job_id = %job.id,
                    suggestion_id = %suggestion.id,
                    error = %error,
                    "failed to notify suggestion ready"
                );
            }
        }

        Ok(AiCompletionResult { job, suggestion })
    }

    async fn store_suggestion(
        &self,
        job: &AiJob,
        mut suggestion: AiSuggestion,
        now: chrono::DateTime<Utc>,
    ) -> AppResult<AiSuggestion> {
        suggestion.id = match suggestion.id.trim() {
            "" => job
                .suggestion_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| {
                    AppError::Validation(format!("ai job '{}' has no suggestion id", job.id))
                })?,
            id => id.to_owned(),
        };
        suggestion.design_id = match suggestion.design_id.trim() {
            "" => job.payload_str("designId").ok_or_else(|| {
                AppError::Validation(format!("ai job '{}' has no design id", job.id))
            })?,
            id => id.to_owned(),
        };
        if suggestion.method.trim().is_empty() {
            suggestion.method = job.payload_str("method").unwrap_or_default();
        }
        if suggestion.status.trim().is_empty() {
            DEFAULT_SUGGESTION_STATUS.clone_into(&mut suggestion.status);
        }
        suggestion.created_at.get_or_insert(now);
        suggestion.updated_at.get_or_insert(now);

        self.repository.save_suggestion(suggestion).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use tokio::sync::Mutex;

    use sealworks_core::{AppError, AppResult};
    use sealworks_domain::{
        AiJob, AiJobCompletion, AiJobError, AiJobStatus, AiSuggestion,
        SuggestionReadyNotification,
    };

    use super::{AiJobRepository, AiJobService, AiSuggestionNotifier};
    use crate::test_support::base_time;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn job(status: AiJobStatus) -> AiJob {
        AiJob {
            id: "aij_1".to_owned(),
            kind: "ai_suggestion".to_owned(),
            status,
            payload: object(json!({
                "designId": "dsg_1",
                "method": "balance",
                "requestedBy": "usr_1",
                "model": "glyph-v2"
            })),
            outputs: Map::new(),
            metadata: Map::new(),
            error: None,
            suggestion_id: Some("sug_1".to_owned()),
            created_at: base_time(),
            updated_at: base_time(),
            completed_at: None,
        }
    }

    #[derive(Default)]
    struct FakeJobs {
        jobs: Mutex<BTreeMap<String, AiJob>>,
        suggestions: Mutex<BTreeMap<String, AiSuggestion>>,
    }

    impl FakeJobs {
        fn with(job: AiJob) -> Self {
            Self {
                jobs: Mutex::new(BTreeMap::from([(job.id.clone(), job)])),
                suggestions: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl AiJobRepository for FakeJobs {
        async fn find_job(&self, job_id: &str) -> AppResult<Option<AiJob>> {
            Ok(self.jobs.lock().await.get(job_id).cloned())
        }

        async fn save_job(&self, job: AiJob) -> AppResult<AiJob> {
            self.jobs.lock().await.insert(job.id.clone(), job.clone());
            Ok(job)
        }

        async fn save_suggestion(&self, suggestion: AiSuggestion) -> AppResult<AiSuggestion> {
            self.suggestions
                .lock()
                .await
                .insert(suggestion.id.clone(), suggestion.clone());
            Ok(suggestion)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<SuggestionReadyNotification>>,
    }

    #[async_trait]
    impl AiSuggestionNotifier for RecordingNotifier {
        async fn notify_suggestion_ready(
            &self,
            notification: SuggestionReadyNotification,
        ) -> AppResult<()> {
            self.sent.lock().await.push(notification);
            if self.fail {
                return Err(AppError::Unavailable("notifier offline".to_owned()));
            }
            Ok(())
        }
    }

    fn success() -> AiJobCompletion {
        AiJobCompletion {
            job_id: "aij_1".to_owned(),
            suggestion: Some(AiSuggestion {
                payload: object(json!({"preview": {"previewUrl": "https://cdn/p.png"}})),
                ..AiSuggestion::default()
            }),
            error: None,
            outputs: object(json!({"score": 0.9})),
            metadata: object(json!({"latencyMs": 80})),
        }
    }

    #[tokio::test]
    async fn success_stores_suggestion_and_notifies() {
        let jobs = Arc::new(FakeJobs::with(job(AiJobStatus::InProgress)));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AiJobService::new(jobs.clone()).with_notifier(notifier.clone());

        let result = service
            .complete(success())
            .await
            .unwrap_or_else(|_| unreachable!("job is open"));

        assert_eq!(result.job.status, AiJobStatus::Succeeded);
        assert!(result.job.completed_at.is_some());
        let suggestion = result
            .suggestion
            .unwrap_or_else(|| unreachable!("suggestion stored"));
        assert_eq!(suggestion.id, "sug_1");
        assert_eq!(suggestion.design_id, "dsg_1");
        assert_eq!(suggestion.method, "balance");
        assert_eq!(suggestion.status, "proposed");
        assert!(jobs.suggestions.lock().await.contains_key("sug_1"));

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].ready_at, result.job.completed_at.unwrap_or_default());
        assert_eq!(sent[0].user_id.as_deref(), Some("usr_1"));
        assert_eq!(
            sent[0].suggestion.payload["preview"]["previewUrl"],
            json!("https://cdn/p.png")
        );
        assert_eq!(sent[0].metadata["worker"]["latencyMs"], json!(80));
    }

    #[tokio::test]
    async fn failure_records_error_without_notification() {
        let jobs = Arc::new(FakeJobs::with(job(AiJobStatus::Queued)));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AiJobService::new(jobs.clone()).with_notifier(notifier.clone());

        let result = service
            .complete(AiJobCompletion {
                suggestion: None,
                error: AiJobError::from_worker("", "model timeout", Some(true)),
                ..success()
            })
            .await
            .unwrap_or_else(|_| unreachable!("job is open"));

        assert_eq!(result.job.status, AiJobStatus::Failed);
        assert_eq!(
            result.job.error.as_ref().map(|error| error.code.as_str()),
            Some("worker_error")
        );
        assert!(result.suggestion.is_none());
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_completion() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let service = AiJobService::new(Arc::new(FakeJobs::with(job(AiJobStatus::InProgress))))
            .with_notifier(notifier.clone());

        assert!(service.complete(success()).await.is_ok());
        assert_eq!(notifier.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn completed_job_is_idempotent() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AiJobService::new(Arc::new(FakeJobs::with(job(AiJobStatus::Succeeded))))
            .with_notifier(notifier.clone());

        let result = service
            .complete(success())
            .await
            .unwrap_or_else(|_| unreachable!("replay is accepted"));
        assert!(result.suggestion.is_none());
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_job_and_missing_id_are_reported() {
        let service = AiJobService::new(Arc::new(FakeJobs::default()));
        assert!(matches!(
            service.complete(success()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .complete(AiJobCompletion {
                    job_id: " ".to_owned(),
                    ..success()
                })
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn success_without_suggestion_id_is_invalid() {
        let mut open = job(AiJobStatus::InProgress);
        open.suggestion_id = None;
        let service = AiJobService::new(Arc::new(FakeJobs::with(open)));
        assert!(matches!(
            service.complete(success()).await,
            Err(AppError::Validation(_))
        ));
    }
}
