use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, StatusCode, header};
use ipnet::IpNet;
use subtle::ConstantTimeEq;

use super::carriers::{Carrier, CarrierAuth};
use crate::api_config::ShippingWebhookSettings;
use crate::error::{ApiError, ApiResult};
use crate::handlers::webhooks::hmac_sha256_matches;
use crate::middleware::bearer_token;
use crate::request::client_ip;

/// Checks the carrier's credential on a webhook call before the body is parsed.
///
/// Returns the verified signature, lowercased, for carriers that sign bodies.
pub fn authenticate_carrier(
    carrier: Carrier,
    settings: &ShippingWebhookSettings,
    headers: &HeaderMap,
    remote: Option<SocketAddr>,
    body: &[u8],
) -> ApiResult<Option<String>> {
    match carrier.auth() {
        CarrierAuth::Hmac { header } => {
            let secret = match carrier {
                Carrier::Dhl => settings.dhl_hmac_secret.as_deref(),
                _ => settings.ups_hmac_secret.as_deref(),
            };
            let signature = header_value(headers, header);
            verify_signature(secret, signature, body)?;
            Ok(signature.map(str::to_ascii_lowercase))
        }
        CarrierAuth::Bearer => {
            let presented = headers
                .get(header::AUTHORIZATION)
                .map(|_| bearer_token(headers).unwrap_or_default());
            verify_token(settings.yamato_token.as_deref(), presented).map(|()| None)
        }
        CarrierAuth::HeaderToken { header } => {
            verify_token(settings.fedex_token.as_deref(), header_value(headers, header))
                .map(|()| None)
        }
        CarrierAuth::Cidr => {
            verify_source(&settings.jppost_allowed_cidrs, client_ip(headers, remote))
                .map(|()| None)
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn verify_signature(secret: Option<&str>, signature: Option<&str>, body: &[u8]) -> ApiResult<()> {
    let Some(secret) = secret.filter(|secret| !secret.is_empty()) else {
        return Err(ApiError::unavailable(
            "webhook_secret_unavailable",
            "webhook secret is not configured",
        ));
    };
    let Some(signature) = signature else {
        return Err(ApiError::bad_request(
            "missing_signature",
            "signature header is required",
        ));
    };
    let decoded = hex::decode(signature)
        .map_err(|_| ApiError::bad_request("invalid_signature", "signature must be hex encoded"))?;

    if !hmac_sha256_matches(secret.as_bytes(), &[body], &decoded) {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            "signature mismatch",
        ));
    }
    Ok(())
}

/// `presented` is `Some("")` when the header exists but carries no usable token.
fn verify_token(expected: Option<&str>, presented: Option<&str>) -> ApiResult<()> {
    let Some(expected) = expected.filter(|token| !token.is_empty()) else {
        return Err(ApiError::unavailable(
            "webhook_auth_unavailable",
            "webhook token is not configured",
        ));
    };
    let Some(presented) = presented else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "missing_auth",
            "authentication header is required",
        ));
    };

    if presented.is_empty() || !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_auth",
            "invalid webhook credentials",
        ));
    }
    Ok(())
}

/// An empty allow-list admits every caller.
fn verify_source(allowed: &[IpNet], ip: Option<IpAddr>) -> ApiResult<()> {
    if allowed.is_empty() {
        return Ok(());
    }
    match ip {
        Some(ip) if allowed.iter().any(|network| network.contains(&ip)) => Ok(()),
        _ => Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            "caller address is not allowed",
        )),
    }
}
