use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    /// `ok` when every capability is wired, `degraded` otherwise.
    pub status: &'static str,
    /// Capabilities that currently answer 503.
    pub unavailable: Vec<String>,
}
