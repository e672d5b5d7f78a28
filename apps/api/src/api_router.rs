use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use sealworks_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, admin_console_url: &str) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/admin/audit-logs",
            get(handlers::audit_logs::list_audit_logs_handler),
        )
        .route(
            "/admin/counters/{counter}",
            post(handlers::counters::next_counter_handler),
        )
        .route(
            "/admin/orders",
            get(handlers::orders::list_orders_handler),
        )
        .route(
            "/admin/orders/{order_id}",
            get(handlers::orders::get_order_handler)
                .put(handlers::orders::update_order_status_handler),
        )
        .route(
            "/admin/orders/{order_id}/shipments",
            post(handlers::orders::create_shipment_handler),
        )
        .route(
            "/admin/orders/{order_id}/shipments/{shipment_id}",
            put(handlers::orders::update_shipment_handler),
        )
        .route(
            "/admin/orders/{order_id}/payments:manual-capture",
            post(handlers::orders::manual_capture_handler),
        )
        .route(
            "/admin/orders/{order_id}/payments:refund",
            post(handlers::orders::refund_payment_handler),
        )
        .route(
            "/admin/production-queues",
            get(handlers::production_queues::list_queues_handler)
                .post(handlers::production_queues::create_queue_handler),
        )
        .route(
            "/admin/production-queues/{queue_id}",
            get(handlers::production_queues::get_queue_handler)
                .put(handlers::production_queues::update_queue_handler)
                .delete(handlers::production_queues::delete_queue_handler)
                .post(handlers::production_queues::assign_order_handler),
        )
        .route(
            "/admin/production-queues/{queue_id}/wip",
            get(handlers::production_queues::queue_wip_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_identity,
        ));

    let internal_routes = Router::new()
        .route(
            "/internal/audit-log",
            post(handlers::audit_logs::write_internal_audit_log_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_service_identity,
        ));

    let webhook_routes = Router::new()
        .route(
            "/webhooks/shipping/{carrier}",
            post(handlers::webhooks::shipping_webhook_handler),
        )
        .route(
            "/webhooks/payments/stripe",
            post(handlers::webhooks::stripe_webhook_handler),
        )
        .route(
            "/webhooks/ai/worker",
            post(handlers::webhooks::ai_worker_callback_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(admin_routes)
        .merge(internal_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(admin_console_url)?)
        .with_state(app_state))
}
