use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use sealworks_core::AppError;
use sealworks_domain::{AiJobCompletion, AiJobError, AiJobStatus};

use crate::dto::AiWorkerCallbackRequest;
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{decode_json, read_required_body};
use crate::state::AppState;

const AI_WORKER_BODY_LIMIT: usize = 256 * 1024;

/// `POST /webhooks/ai/worker`
///
/// Always answers 202 once the job is closed out; notification delivery is
/// best effort inside the job service.
pub async fn ai_worker_callback_handler(
    State(state): State<AppState>,
    body: Body,
) -> ApiResult<StatusCode> {
    let service = state.ai_job_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("service_unavailable", "ai job dispatcher unavailable")
    })?;

    let bytes = read_required_body(body, AI_WORKER_BODY_LIMIT).await?;
    let request: AiWorkerCallbackRequest = decode_json(&bytes, "invalid_request")?;
    tracing::debug!(
        job_id = %request.job_id,
        method = request.method.as_deref(),
        model = request.model.as_deref(),
        "received ai worker callback"
    );
    let completion = build_completion(request)?;
    let job_id = completion.job_id.clone();

    match service.complete(completion).await {
        Ok(result) => {
            tracing::info!(
                job_id = %result.job.id,
                status = %result.job.status,
                suggestion_id = result.suggestion.as_ref().map(|suggestion| suggestion.id.as_str()),
                "completed ai job"
            );
            Ok(StatusCode::ACCEPTED)
        }
        Err(AppError::NotFound(detail)) => {
            tracing::info!(job_id = %job_id, detail = %detail, "ignored callback for unknown ai job");
            Ok(StatusCode::ACCEPTED)
        }
        Err(error) => Err(map_ai_job_error(&error)),
    }
}

fn build_completion(request: AiWorkerCallbackRequest) -> ApiResult<AiJobCompletion> {
    let job_id = request.job_id.trim().to_owned();
    if job_id.is_empty() {
        return Err(ApiError::invalid_request("jobId is required"));
    }
    let status = AiJobStatus::from_worker(&request.status).ok_or_else(|| {
        ApiError::invalid_request("status must be succeeded or failed")
    })?;

    let (suggestion, error) = if status == AiJobStatus::Failed {
        let Some(details) = request.error.as_ref() else {
            return Err(ApiError::invalid_request(
                "error details are required when status is failed",
            ));
        };
        let error = AiJobError::from_worker(&details.code, &details.message, details.retryable)
            .ok_or_else(|| ApiError::invalid_request("error.code or error.message is required"))?;
        (None, Some(error))
    } else {
        (Some(request.suggestion_projection()), None)
    };

    Ok(AiJobCompletion {
        job_id,
        suggestion,
        error,
        outputs: request.outputs,
        metadata: request.metadata,
    })
}

fn map_ai_job_error(error: &AppError) -> ApiError {
    match error {
        AppError::Validation(_) => ApiError::invalid_request(error_detail(error)),
        AppError::Unavailable(_) => {
            ApiError::unavailable("service_unavailable", "storage temporarily unavailable")
        }
        _ => ApiError::internal("webhook_error", error_detail(error)),
    }
}
