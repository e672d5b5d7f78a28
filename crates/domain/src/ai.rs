use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle states of an asynchronous AI job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiJobStatus {
    /// Waiting for a worker.
    Queued,
    /// Picked up by a worker.
    InProgress,
    /// Worker reported success.
    Succeeded,
    /// Worker reported failure.
    Failed,
}

impl AiJobStatus {
    /// Returns the stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Maps a worker-reported outcome onto a terminal status.
    ///
    /// Returns `None` for anything that is not a recognised success or failure spelling.
    #[must_use]
    pub fn from_worker(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "success" | "completed" | "ok" => Some(Self::Succeeded),
            "failed" | "error" | "errored" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns whether the job has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl Display for AiJobStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failure details reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiJobError {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Whether the worker considers a retry worthwhile.
    pub retryable: bool,
}

impl AiJobError {
    /// Code used when the worker reports only a message.
    pub const DEFAULT_CODE: &'static str = "worker_error";

    /// Builds an error from worker fields; needs at least a code or a message.
    #[must_use]
    pub fn from_worker(code: &str, message: &str, retryable: Option<bool>) -> Option<Self> {
        let code = code.trim();
        let message = message.trim();
        if code.is_empty() && message.is_empty() {
            return None;
        }

        Some(Self {
            code: if code.is_empty() {
                Self::DEFAULT_CODE.to_owned()
            } else {
                code.to_owned()
            },
            message: message.to_owned(),
            retryable: retryable.unwrap_or(false),
        })
    }
}

/// Asynchronous AI job as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiJob {
    /// Job identifier.
    pub id: String,
    /// Job kind, e.g. `ai_suggestion`.
    pub kind: String,
    /// Lifecycle status.
    pub status: AiJobStatus,
    /// Enqueue payload (`requestedBy`, `model`, `method`, ...).
    pub payload: Map<String, Value>,
    /// Worker outputs, set on completion.
    pub outputs: Map<String, Value>,
    /// Worker metadata, set on completion.
    pub metadata: Map<String, Value>,
    /// Failure details, set when the job failed.
    pub error: Option<AiJobError>,
    /// Suggestion produced by the job, if any.
    pub suggestion_id: Option<String>,
    /// Enqueue time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl AiJob {
    /// Reads a trimmed, non-empty string field from the enqueue payload.
    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<String> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

/// Design suggestion produced by an AI job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    /// Suggestion identifier.
    pub id: String,
    /// Design the suggestion belongs to.
    pub design_id: String,
    /// Generation method.
    pub method: String,
    /// Suggestion status, e.g. `proposed`.
    pub status: String,
    /// Suggestion body.
    pub payload: Map<String, Value>,
    /// Creation time reported by the worker.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time reported by the worker.
    pub updated_at: Option<DateTime<Utc>>,
    /// Expiry time reported by the worker.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Worker callback closing out a job.
#[derive(Debug, Clone, PartialEq)]
pub struct AiJobCompletion {
    /// Job being completed.
    pub job_id: String,
    /// Suggestion projection, present on success.
    pub suggestion: Option<AiSuggestion>,
    /// Failure details, present on failure.
    pub error: Option<AiJobError>,
    /// Worker outputs.
    pub outputs: Map<String, Value>,
    /// Worker metadata.
    pub metadata: Map<String, Value>,
}

/// Persisted job and the suggestion it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AiCompletionResult {
    /// Job after completion.
    pub job: AiJob,
    /// Stored suggestion, if the job produced one.
    pub suggestion: Option<AiSuggestion>,
}

/// Message sent when a suggestion becomes available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionReadyNotification {
    /// Completed job.
    pub job_id: String,
    /// Design the suggestion belongs to.
    pub design_id: String,
    /// Suggestion identifier.
    pub suggestion_id: String,
    /// Generation method.
    pub method: String,
    /// User who requested the job.
    pub user_id: Option<String>,
    /// Model that produced the suggestion.
    pub model: Option<String>,
    /// When the suggestion became available.
    pub ready_at: DateTime<Utc>,
    /// Suggestion snapshot.
    pub suggestion: AiSuggestion,
    /// Worker outputs.
    pub outputs: Map<String, Value>,
    /// `job` (enqueue payload) and `worker` (callback metadata) sections.
    pub metadata: Map<String, Value>,
}

impl SuggestionReadyNotification {
    /// Assembles the notification for `suggestion` produced by `job`.
    ///
    /// `now` is used only when the job carries no completion time.
    #[must_use]
    pub fn build(
        job: &AiJob,
        suggestion: &AiSuggestion,
        outputs: &Map<String, Value>,
        worker_metadata: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        let method = match suggestion.method.trim() {
            "" => job.payload_str("method").unwrap_or_default(),
            method => method.to_owned(),
        };

        let mut metadata = Map::new();
        if !job.payload.is_empty() {
            metadata.insert("job".to_owned(), Value::Object(job.payload.clone()));
        }
        if !worker_metadata.is_empty() {
            metadata.insert("worker".to_owned(), Value::Object(worker_metadata.clone()));
        }

        Self {
            job_id: job.id.trim().to_owned(),
            design_id: suggestion.design_id.trim().to_owned(),
            suggestion_id: suggestion.id.trim().to_owned(),
            method,
            user_id: job.payload_str("requestedBy"),
            model: job.payload_str("model"),
            ready_at: job.completed_at.unwrap_or(now),
            suggestion: suggestion.clone(),
            outputs: outputs.clone(),
            metadata,
        }
    }
}
