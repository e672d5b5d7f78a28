use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sealworks_core::AppError;

/// Scheduling priority of a production queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionQueuePriority {
    /// Regular work.
    #[default]
    Normal,
    /// Expedited work.
    Rush,
}

impl ProductionQueuePriority {
    /// Returns the stable transport value for this priority.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Rush => "rush",
        }
    }
}

impl Display for ProductionQueuePriority {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ProductionQueuePriority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "rush" => Ok(Self::Rush),
            other => Err(AppError::Validation(format!(
                "unsupported priority '{other}'"
            ))),
        }
    }
}

/// Operational state of a production queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionQueueStatus {
    /// Accepting work.
    #[default]
    Active,
    /// Temporarily not accepting work.
    Paused,
    /// Retired.
    Archived,
}

impl ProductionQueueStatus {
    /// Returns the stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }
}

impl Display for ProductionQueueStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ProductionQueueStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "archived" => Ok(Self::Archived),
            other => Err(AppError::Validation(format!(
                "unsupported status '{other}'"
            ))),
        }
    }
}

/// Configurable production work queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionQueue {
    /// Queue identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Maximum concurrent orders, 0 means unlimited.
    pub capacity: u32,
    /// Work centers served by the queue.
    pub work_centers: Vec<String>,
    /// Scheduling priority.
    pub priority: ProductionQueuePriority,
    /// Operational state.
    pub status: ProductionQueueStatus,
    /// Staff notes.
    pub notes: Option<String>,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time workload summary of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionQueueWip {
    /// Queue identifier.
    pub queue_id: String,
    /// Orders currently in the queue.
    pub total: i64,
    /// Orders per status.
    pub status_counts: BTreeMap<String, i64>,
    /// Mean order age.
    pub average_age: Duration,
    /// Age of the oldest order.
    pub oldest_age: Duration,
    /// Orders older than the queue SLA.
    pub sla_breach_count: i64,
    /// When the summary was computed.
    pub generated_at: DateTime<Utc>,
}

impl ProductionQueueWip {
    /// Clamps negative values, normalizes status keys, and fills a missing id.
    ///
    /// When status counts are present the total is recomputed from them.
    #[must_use]
    pub fn normalized(self, fallback_queue_id: &str) -> Self {
        let queue_id = match self.queue_id.trim() {
            "" => fallback_queue_id.trim().to_owned(),
            id => id.to_owned(),
        };

        let mut status_counts = BTreeMap::new();
        for (key, count) in self.status_counts {
            let key = normalize_status_count_key(&key);
            if key.is_empty() {
                continue;
            }
            *status_counts.entry(key).or_insert(0) += count.max(0);
        }

        let total = if status_counts.is_empty() {
            self.total.max(0)
        } else {
            status_counts.values().sum()
        };

        Self {
            queue_id,
            total,
            status_counts,
            average_age: self.average_age.max(Duration::zero()),
            oldest_age: self.oldest_age.max(Duration::zero()),
            sla_breach_count: self.sla_breach_count.max(0),
            generated_at: self.generated_at,
        }
    }
}

/// Lowercases a status key and turns spaces and dashes into underscores.
#[must_use]
pub fn normalize_status_count_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Trims work centers and drops blank or case-insensitive duplicates.
#[must_use]
pub fn normalize_work_centers(work_centers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    work_centers
        .iter()
        .map(|center| center.trim())
        .filter(|center| !center.is_empty() && seen.insert(center.to_lowercase()))
        .map(str::to_owned)
        .collect()
}
