use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use sealworks_core::AppError;
use tower_http::cors::CorsLayer;

const NEXT_PAGE_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-next-page-token");

/// Allows the admin console origin to call the admin API with bearer tokens.
pub(super) fn build_cors_layer(admin_console_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(admin_console_url).map_err(|error| {
            AppError::Internal(format!("invalid ADMIN_CONSOLE_URL: {error}"))
        })?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([NEXT_PAGE_TOKEN_HEADER]))
}
