use async_trait::async_trait;
use tokio::sync::RwLock;

use sealworks_application::AuditLogRepository;
use sealworks_core::{AppError, AppResult};
use sealworks_domain::{AuditLogEntry, AuditLogFilter, CursorPage};

use crate::page_cursor::paginate;

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored entry in append order.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|stored| stored.id == entry.id) {
            return Err(AppError::Conflict(format!(
                "audit entry '{}' already exists",
                entry.id
            )));
        }

        entries.push(entry);
        Ok(())
    }

    async fn list(&self, filter: &AuditLogFilter) -> AppResult<CursorPage<AuditLogEntry>> {
        let mut matching: Vec<AuditLogEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });

        paginate(matching, &filter.page)
    }
}
