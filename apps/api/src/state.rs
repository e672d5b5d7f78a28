use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use sealworks_application::{
    AiJobService, AuditLogService, Authenticator, CounterService, OrderService, PaymentService,
    ProductionQueueService, QueueDepthRecorder, ShipmentService, StripeSecretFetcher,
    WebhookMetricsRecorder, WebhookReplayGuard,
};

use crate::api_config::ShippingWebhookSettings;

/// Shared application state.
///
/// Services are optional so a partially wired deployment answers with 503
/// for the missing capability instead of failing to start.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn Authenticator>,
    pub audit_log_service: Option<AuditLogService>,
    pub counter_service: Option<CounterService>,
    pub counter_allowed_scopes: Arc<BTreeSet<String>>,
    pub order_service: Option<OrderService>,
    pub shipment_service: Option<ShipmentService>,
    pub payment_service: Option<PaymentService>,
    pub production_queue_service: Option<ProductionQueueService>,
    pub queue_depth_recorder: Option<Arc<dyn QueueDepthRecorder>>,
    pub ai_job_service: Option<AiJobService>,
    pub shipping_webhooks: Arc<ShippingWebhookSettings>,
    pub stripe_secret_fetcher: Option<Arc<dyn StripeSecretFetcher>>,
    pub stripe_tolerance: Duration,
    pub webhook_replay: Option<WebhookReplayGuard>,
    pub webhook_metrics: Option<Arc<dyn WebhookMetricsRecorder>>,
}

impl AppState {
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            audit_log_service: None,
            counter_service: None,
            counter_allowed_scopes: Arc::new(BTreeSet::new()),
            order_service: None,
            shipment_service: None,
            payment_service: None,
            production_queue_service: None,
            queue_depth_recorder: None,
            ai_job_service: None,
            shipping_webhooks: Arc::new(ShippingWebhookSettings::default()),
            stripe_secret_fetcher: None,
            stripe_tolerance: Duration::minutes(5),
            webhook_replay: None,
            webhook_metrics: None,
        }
    }
}
