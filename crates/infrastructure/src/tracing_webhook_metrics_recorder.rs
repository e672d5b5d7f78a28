use async_trait::async_trait;

use sealworks_application::WebhookMetricsRecorder;
use sealworks_core::AppResult;

const MAX_OUTCOME_LEN: usize = 48;

/// Emits webhook outcomes as structured `tracing` events for log-based metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWebhookMetricsRecorder;

#[async_trait]
impl WebhookMetricsRecorder for TracingWebhookMetricsRecorder {
    async fn record_webhook_outcome(
        &self,
        source: &str,
        outcome: &str,
        elapsed: std::time::Duration,
    ) -> AppResult<()> {
        tracing::info!(
            metric = "webhooks.security.requests",
            source,
            outcome = %sanitize_outcome(outcome),
            latency_ms = elapsed.as_secs_f64() * 1000.0,
            "webhook outcome"
        );
        Ok(())
    }
}

fn sanitize_outcome(outcome: &str) -> String {
    let outcome = outcome.trim().to_ascii_lowercase();
    if outcome.is_empty() {
        return "unknown".to_owned();
    }
    outcome.chars().take(MAX_OUTCOME_LEN).collect()
}
