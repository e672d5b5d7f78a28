use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::dto::OrderSummaryResponse;

/// Queue document accepted on create and update.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(deny_unknown_fields)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/production-queue-request.ts"
)]
pub struct ProductionQueueRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub work_centers: Vec<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/production-queue-response.ts"
)]
pub struct ProductionQueueResponse {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub work_centers: Vec<String>,
    pub priority: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/production-queue-list-response.ts"
)]
pub struct ProductionQueueListResponse {
    pub items: Vec<ProductionQueueResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Point-in-time work-in-progress summary for one queue.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/production-queue-wip-response.ts"
)]
pub struct ProductionQueueWipResponse {
    pub queue_id: String,
    #[ts(type = "number")]
    pub total: i64,
    #[ts(type = "Record<string, number>")]
    pub counts: BTreeMap<String, i64>,
    #[ts(type = "number")]
    pub average_age_seconds: i64,
    #[ts(type = "number")]
    pub oldest_age_seconds: i64,
    #[ts(type = "number")]
    pub sla_breach_count: i64,
    pub generated_at: String,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/queue-assignment-request.ts"
)]
pub struct QueueAssignmentRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub expected_status: Option<String>,
    #[serde(default)]
    pub expected_queue_id: Option<String>,
    #[serde(default)]
    pub if_unmodified_since: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/queue-assignment-response.ts"
)]
pub struct QueueAssignmentResponse {
    pub order: OrderSummaryResponse,
}
