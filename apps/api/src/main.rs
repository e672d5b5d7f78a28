//! Sealworks admin API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod request;
mod state;

use std::net::SocketAddr;

use sealworks_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::build_app_state;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    info!(
        counter_scopes = config.counter_allowed_scopes.len(),
        shipping = ?config.shipping,
        stripe_webhooks = config.stripe_webhook_secret.is_some(),
        "loaded api configuration"
    );

    let app_state = build_app_state(&config)?;
    let app = build_router(app_state, &config.admin_console_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "sealworks-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
