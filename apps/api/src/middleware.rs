use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use sealworks_core::Principal;
use sealworks_domain::mask_email;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Resolves the bearer token to a user identity for admin routes.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = authenticate(&state, request.headers()).await?;
    let Some(Principal::User(identity)) = principal else {
        return Err(ApiError::unauthenticated("authentication required"));
    };

    tracing::debug!(
        subject = identity.subject(),
        email = %identity.email().map(mask_email).unwrap_or_default(),
        "authenticated admin request"
    );
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Resolves the bearer token to a service identity for internal routes.
pub async fn require_service_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = authenticate(&state, request.headers()).await?;
    let Some(Principal::Service(service)) = principal else {
        return Err(ApiError::unauthenticated("service authentication required"));
    };

    tracing::debug!(service = service.name(), "authenticated internal request");
    request.extensions_mut().insert(service);
    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<Principal>> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    state.authenticator.authenticate(token).await.map_err(|error| {
        tracing::warn!(error = %error, "token authentication failed");
        ApiError::unauthenticated("authentication required")
    })
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|token| !token.is_empty())
}
