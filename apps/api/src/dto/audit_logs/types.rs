use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// One field change in an audit diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-diff-value-dto.ts"
)]
pub struct AuditDiffValueDto {
    #[ts(type = "unknown")]
    #[serde(default)]
    pub before: Value,
    #[ts(type = "unknown")]
    #[serde(default)]
    pub after: Value,
}

/// Audit entry as seen by an admin or staff reader.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub actor: String,
    pub actor_type: String,
    pub action: String,
    pub target_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: String,
    #[ts(type = "Record<string, unknown> | null")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<BTreeMap<String, AuditDiffValueDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_redacted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_redacted: Option<bool>,
}

/// Page of audit entries.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-list-response.ts"
)]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLogEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Internal audit append submitted by trusted services.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-write-request.ts"
)]
pub struct AuditLogWriteRequest {
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub target_ref: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub diff: BTreeMap<String, AuditDiffValueDto>,
    #[serde(default)]
    pub sensitive_metadata_keys: Vec<String>,
    #[serde(default)]
    pub sensitive_diff_keys: Vec<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Identifier assigned to an appended audit entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-write-response.ts"
)]
pub struct AuditLogWriteResponse {
    pub id: String,
}
