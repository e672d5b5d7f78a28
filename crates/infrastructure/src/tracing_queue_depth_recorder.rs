use std::collections::BTreeMap;

use async_trait::async_trait;

use sealworks_application::QueueDepthRecorder;
use sealworks_core::AppResult;

/// Emits queue depth as structured `tracing` events for log-based metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingQueueDepthRecorder;

#[async_trait]
impl QueueDepthRecorder for TracingQueueDepthRecorder {
    async fn record_queue_depth(
        &self,
        queue_id: &str,
        total: i64,
        status_counts: &BTreeMap<String, i64>,
    ) -> AppResult<()> {
        for (status, count) in status_counts {
            tracing::info!(
                metric = "production_queue.depth",
                queue_id,
                status = %status,
                count,
                "queue depth by status"
            );
        }
        tracing::info!(
            metric = "production_queue.depth",
            queue_id,
            total,
            "queue depth"
        );

        Ok(())
    }
}
