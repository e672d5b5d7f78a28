use std::collections::BTreeMap;

use sealworks_domain::{AuditDiff, AuditDiffValue, AuditLogEntry};

use super::types::{AuditDiffValueDto, AuditLogEntryResponse};
use crate::dto::common::format_timestamp;

impl From<AuditDiffValue> for AuditDiffValueDto {
    fn from(value: AuditDiffValue) -> Self {
        Self {
            before: value.before,
            after: value.after,
        }
    }
}

impl From<AuditDiffValueDto> for AuditDiffValue {
    fn from(value: AuditDiffValueDto) -> Self {
        Self::new(value.before, value.after)
    }
}

fn diff_dto(diff: AuditDiff) -> BTreeMap<String, AuditDiffValueDto> {
    diff.into_iter()
        .map(|(key, value)| (key, AuditDiffValueDto::from(value)))
        .collect()
}

impl AuditLogEntryResponse {
    /// Admin projection: sensitive maps merged back, request id and IP hash surfaced.
    #[must_use]
    pub fn full(entry: AuditLogEntry) -> Self {
        let metadata = entry.has_metadata().then(|| entry.full_metadata());
        let diff = entry.has_diff().then(|| diff_dto(entry.full_diff()));

        Self {
            id: entry.id,
            actor: entry.actor,
            actor_type: entry.actor_type,
            action: entry.action,
            target_ref: entry.target_ref,
            severity: entry.severity,
            request_id: entry.request_id,
            ip_hash: entry.ip_hash,
            user_agent: entry.user_agent,
            created_at: format_timestamp(entry.created_at),
            metadata,
            diff,
            metadata_redacted: None,
            diff_redacted: None,
        }
    }

    /// Staff projection: metadata and diff elided, flagged when something was hidden.
    #[must_use]
    pub fn redacted(entry: AuditLogEntry) -> Self {
        let metadata_redacted = entry.has_metadata().then_some(true);
        let diff_redacted = entry.has_diff().then_some(true);

        Self {
            id: entry.id,
            actor: entry.actor,
            actor_type: entry.actor_type,
            action: entry.action,
            target_ref: entry.target_ref,
            severity: entry.severity,
            request_id: None,
            ip_hash: None,
            user_agent: entry.user_agent,
            created_at: format_timestamp(entry.created_at),
            metadata: None,
            diff: None,
            metadata_redacted,
            diff_redacted,
        }
    }
}
