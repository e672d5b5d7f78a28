use serde::Deserialize;
use serde_json::{Map, Value};
use ts_rs::TS;

/// Completion callback posted by the AI worker.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ai-worker-callback-request.ts"
)]
pub struct AiWorkerCallbackRequest {
    #[serde(default, alias = "job_id")]
    pub job_id: String,
    #[serde(default, alias = "suggestion_id")]
    pub suggestion_id: Option<String>,
    #[serde(default, alias = "design_id")]
    pub design_id: Option<String>,
    /// Generation method reported by the worker. Logged, never stored.
    #[serde(default)]
    pub method: Option<String>,
    /// Model reported by the worker. Logged, never stored.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: String,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub error: Option<AiWorkerErrorDto>,
    #[serde(default)]
    pub suggestion: Option<AiWorkerSuggestionDto>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ai-worker-error-dto.ts"
)]
pub struct AiWorkerErrorDto {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub retryable: Option<bool>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ai-worker-suggestion-dto.ts"
)]
pub struct AiWorkerSuggestionDto {
    #[serde(default)]
    pub status: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<String>,
    #[serde(default, alias = "expires_at")]
    pub expires_at: Option<String>,
}
