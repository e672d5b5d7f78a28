use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;
use sha2::{Digest, Sha256};

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    AuditDiff, AuditLogEntry, AuditLogFilter, AuditLogRecord, CursorPage,
    normalize_sensitive_keys, split_sensitive,
};

use crate::id_generator::{IdGenerator, UuidV7Generator};

/// Repository port for append-only audit entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()>;

    /// Lists entries matching `filter`, newest first.
    async fn list(&self, filter: &AuditLogFilter) -> AppResult<CursorPage<AuditLogEntry>>;
}

/// Application service for writing and reading audit entries.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl AuditLogService {
    /// Creates a service that stamps UUIDv7 identifiers.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self {
            repository,
            ids: Arc::new(UuidV7Generator),
        }
    }

    /// Replaces the identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Validates and appends a record, returning the stored entry.
    pub async fn record(&self, record: AuditLogRecord) -> AppResult<AuditLogEntry> {
        record.validate()?;

        let id = record
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| self.ids.generate(), str::to_owned);

        let metadata_keys = normalize_sensitive_keys(&record.sensitive_metadata_keys);
        let diff_keys = normalize_sensitive_keys(&record.sensitive_diff_keys);

        let (metadata, sensitive_metadata) = split_sensitive(record.metadata, &metadata_keys);
        let diff = record
            .diff
            .into_iter()
            .map(|(field, value)| (field.trim().to_owned(), value))
            .filter(|(field, _)| !field.is_empty());
        let (diff, sensitive_diff) = split_sensitive(diff, &diff_keys);

        let entry = AuditLogEntry {
            id,
            actor: record.actor.trim().to_owned(),
            actor_type: record.actor_type.trim().to_owned(),
            action: record.action.trim().to_owned(),
            target_ref: record.target_ref.trim().to_owned(),
            severity: trimmed(record.severity),
            request_id: trimmed(record.request_id),
            ip_hash: record.ip_address.as_deref().and_then(hash_ip),
            user_agent: trimmed(record.user_agent),
            created_at: record.occurred_at.unwrap_or_else(Utc::now),
            metadata: metadata.into_iter().collect::<Map<_, _>>(),
            diff: diff.into_iter().collect::<AuditDiff>(),
            sensitive_metadata: sensitive_metadata.into_iter().collect::<Map<_, _>>(),
            sensitive_diff: sensitive_diff.into_iter().collect::<AuditDiff>(),
        };

        self.repository.append(entry.clone()).await?;
        Ok(entry)
    }

    /// Lists entries for one target reference.
    pub async fn list(&self, filter: AuditLogFilter) -> AppResult<CursorPage<AuditLogEntry>> {
        if filter.target_ref.trim().is_empty() {
            return Err(AppError::Validation("targetRef is required".to_owned()));
        }
        if let (Some(after), Some(before)) = (filter.created_after, filter.created_before)
            && after > before
        {
            return Err(AppError::Validation(
                "from must not be after to".to_owned(),
            ));
        }

        self.repository.list(&filter).await
    }
}

/// Hex SHA-256 of the trimmed IP address; blank input yields `None`.
#[must_use]
pub fn hash_ip(ip_address: &str) -> Option<String> {
    let ip_address = ip_address.trim();
    if ip_address.is_empty() {
        return None;
    }

    Some(hex::encode(Sha256::digest(ip_address.as_bytes())))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
