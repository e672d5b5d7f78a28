use async_trait::async_trait;

use sealworks_application::AiSuggestionNotifier;
use sealworks_core::{AppError, AppResult};
use sealworks_domain::SuggestionReadyNotification;

/// Publishes suggestion-ready notifications as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSuggestionNotifier;

#[async_trait]
impl AiSuggestionNotifier for TracingSuggestionNotifier {
    async fn notify_suggestion_ready(
        &self,
        notification: SuggestionReadyNotification,
    ) -> AppResult<()> {
        let body = serde_json::to_string(&notification).map_err(|error| {
            AppError::Internal(format!("failed to encode suggestion notification: {error}"))
        })?;

        tracing::info!(
            job_id = %notification.job_id,
            suggestion_id = %notification.suggestion_id,
            design_id = %notification.design_id,
            user_id = notification.user_id.as_deref().unwrap_or_default(),
            ready_at = %notification.ready_at.to_rfc3339(),
            body = %body,
            "ai suggestion ready"
        );

        Ok(())
    }
}
