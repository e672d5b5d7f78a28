use sealworks_domain::AuditLogRecord;

use crate::state::AppState;

/// Appends an audit entry after a successful mutation.
///
/// Failures are logged and never change the response.
pub(crate) async fn record_audit(state: &AppState, record: AuditLogRecord) {
    let Some(service) = state.audit_log_service.as_ref() else {
        tracing::debug!(action = %record.action, "audit log service not configured");
        return;
    };

    let action = record.action.clone();
    let target_ref = record.target_ref.clone();
    if let Err(error) = service.record(record).await {
        tracing::warn!(
            action = %action,
            target_ref = %target_ref,
            error = %error,
            "failed to record audit entry"
        );
    }
}
