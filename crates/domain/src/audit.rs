use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sealworks_core::{AppError, AppResult};

use crate::pagination::PageRequest;

/// Before/after pair of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDiffValue {
    /// Value before the change.
    pub before: Value,
    /// Value after the change.
    pub after: Value,
}

impl AuditDiffValue {
    /// Builds a diff pair from two serializable values.
    #[must_use]
    pub fn new(before: impl Into<Value>, after: impl Into<Value>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Field-level diff keyed by field name.
pub type AuditDiff = BTreeMap<String, AuditDiffValue>;

/// Audit record as submitted by a writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLogRecord {
    /// Caller-chosen identifier.
    pub id: Option<String>,
    /// Acting principal.
    pub actor: String,
    /// Kind of actor, e.g. `admin`, `staff`, `service`.
    pub actor_type: String,
    /// Action name, e.g. `order.status.transition`.
    pub action: String,
    /// Path-style reference of the subject.
    pub target_ref: String,
    /// Severity label.
    pub severity: Option<String>,
    /// Correlating request identifier.
    pub request_id: Option<String>,
    /// When the action happened; defaults to the server clock.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Free metadata.
    pub metadata: Map<String, Value>,
    /// Field diff.
    pub diff: AuditDiff,
    /// Metadata keys that only admins may read.
    pub sensitive_metadata_keys: Vec<String>,
    /// Diff keys that only admins may read.
    pub sensitive_diff_keys: Vec<String>,
    /// Caller IP address, hashed before storage.
    pub ip_address: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
}

impl AuditLogRecord {
    /// Starts a record with the four required fields.
    #[must_use]
    pub fn new(
        actor: impl Into<String>,
        actor_type: impl Into<String>,
        action: impl Into<String>,
        target_ref: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            actor_type: actor_type.into(),
            action: action.into(),
            target_ref: target_ref.into(),
            ..Self::default()
        }
    }

    /// Checks that actor, action, and target reference are present.
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("actor", &self.actor),
            ("action", &self.action),
            ("targetRef", &self.target_ref),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        Ok(())
    }
}

/// Stored, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Authoritative identifier.
    pub id: String,
    /// Acting principal.
    pub actor: String,
    /// Kind of actor.
    pub actor_type: String,
    /// Action name.
    pub action: String,
    /// Path-style reference of the subject.
    pub target_ref: String,
    /// Severity label.
    pub severity: Option<String>,
    /// Correlating request identifier.
    pub request_id: Option<String>,
    /// Hex SHA-256 of the caller IP.
    pub ip_hash: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
    /// Free metadata, sensitive keys removed.
    pub metadata: Map<String, Value>,
    /// Field diff, sensitive keys removed.
    pub diff: AuditDiff,
    /// Sensitive metadata.
    pub sensitive_metadata: Map<String, Value>,
    /// Sensitive diff entries.
    pub sensitive_diff: AuditDiff,
}

impl AuditLogEntry {
    /// Metadata including sensitive keys.
    #[must_use]
    pub fn full_metadata(&self) -> Map<String, Value> {
        let mut merged = self.metadata.clone();
        for (key, value) in &self.sensitive_metadata {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Diff including sensitive keys.
    #[must_use]
    pub fn full_diff(&self) -> AuditDiff {
        let mut merged = self.diff.clone();
        merged.extend(
            self.sensitive_diff
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        merged
    }

    /// Whether any metadata, sensitive or not, was recorded.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        !self.metadata.is_empty() || !self.sensitive_metadata.is_empty()
    }

    /// Whether any diff, sensitive or not, was recorded.
    #[must_use]
    pub fn has_diff(&self) -> bool {
        !self.diff.is_empty() || !self.sensitive_diff.is_empty()
    }
}

/// Listing filter; `target_ref` is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Subject reference.
    pub target_ref: String,
    /// Actor filter.
    pub actor: Option<String>,
    /// Actor type filter.
    pub actor_type: Option<String>,
    /// Action filter.
    pub action: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    /// Page size and cursor.
    pub page: PageRequest,
}

impl AuditLogFilter {
    /// Returns whether `entry` satisfies every filter except pagination.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        entry.target_ref == self.target_ref
            && self
                .actor
                .as_deref()
                .is_none_or(|actor| entry.actor == actor)
            && self
                .actor_type
                .as_deref()
                .is_none_or(|actor_type| entry.actor_type.eq_ignore_ascii_case(actor_type))
            && self
                .action
                .as_deref()
                .is_none_or(|action| entry.action == action)
            && self
                .created_after
                .is_none_or(|after| entry.created_at >= after)
            && self
                .created_before
                .is_none_or(|before| entry.created_at <= before)
    }
}

/// Trims keys and removes blank or case-insensitive duplicates, keeping first spelling.
#[must_use]
pub fn normalize_sensitive_keys(keys: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty() && seen.insert(key.to_lowercase()))
        .map(str::to_owned)
        .collect()
}

/// Moves entries whose key matches `sensitive_keys` (case-insensitively) out of `source`.
pub fn split_sensitive<V>(
    source: impl IntoIterator<Item = (String, V)>,
    sensitive_keys: &[String],
) -> (Vec<(String, V)>, Vec<(String, V)>) {
    let lowered: HashSet<String> = sensitive_keys.iter().map(|key| key.to_lowercase()).collect();
    source
        .into_iter()
        .partition(|(key, _)| !lowered.contains(&key.to_lowercase()))
}
