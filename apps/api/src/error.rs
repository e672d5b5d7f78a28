use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sealworks_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error carrying a status, a stable snake_case code, and a short message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::bad_request("invalid_request", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn insufficient_role() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "insufficient_role",
            "insufficient role for this operation",
        )
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!("request body exceeds {limit} bytes"),
        )
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// Strips the category prefix `AppError`'s display adds, keeping the detail.
pub fn error_detail(error: &AppError) -> String {
    match error {
        AppError::Validation(detail)
        | AppError::NotFound(detail)
        | AppError::Conflict(detail)
        | AppError::InvalidState(detail)
        | AppError::InUse(detail)
        | AppError::Exhausted(detail)
        | AppError::Unauthorized(detail)
        | AppError::Forbidden(detail)
        | AppError::Unavailable(detail)
        | AppError::DeadlineExceeded(detail)
        | AppError::Canceled(detail)
        | AppError::Internal(detail) => detail.clone(),
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        let (status, code) = match &value {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) | AppError::InvalidState(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::InUse(_) => (StatusCode::CONFLICT, "in_use"),
            AppError::Exhausted(_) => (StatusCode::CONFLICT, "exhausted"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "insufficient_role"),
            AppError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            AppError::DeadlineExceeded(_) => (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded"),
            AppError::Canceled(_) => (StatusCode::REQUEST_TIMEOUT, "canceled"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        Self::new(status, code, error_detail(&value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.code, self.message));
        (self.status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
