use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Optional options for advancing a counter.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/counter-next-request.ts"
)]
pub struct CounterNextRequest {
    /// Segment selector; a map of scalar values overriding the path segment.
    #[ts(type = "Record<string, string | number | boolean> | null")]
    #[serde(default)]
    pub scope: Option<Value>,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub step: Option<i64>,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub max_value: Option<i64>,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub initial_value: Option<i64>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub pad_length: Option<i64>,
}

/// Formatted counter value.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/counter-next-response.ts"
)]
pub struct CounterNextResponse {
    pub number: String,
}
