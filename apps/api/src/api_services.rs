use std::sync::Arc;

use chrono::Duration;
use sealworks_application::{
    AiJobRepository, AiJobService, AuditLogRepository, AuditLogService, CounterRepository,
    CounterService, OrderRepository, OrderService, PaymentEventLedger, PaymentService,
    ProductionQueueRepository, ProductionQueueService, QueueDepthRecorder, ShipmentService,
    StripeSecretFetcher, WebhookReplayGuard, WebhookReplayStore,
};
use sealworks_core::AppError;
use sealworks_infrastructure::{
    EnvStripeSecretFetcher, InMemoryAiJobRepository, InMemoryAuditLogRepository,
    InMemoryCounterRepository, InMemoryOrderRepository, InMemoryPaymentEventLedger,
    InMemoryProductionQueueRepository, InMemoryWebhookReplayStore, StaticTokenAuthenticator,
    TracingQueueDepthRecorder, TracingSuggestionNotifier, TracingWebhookMetricsRecorder,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

struct RepositorySet {
    audit_logs: Arc<dyn AuditLogRepository>,
    counters: Arc<dyn CounterRepository>,
    orders: Arc<dyn OrderRepository>,
    production_queues: Arc<dyn ProductionQueueRepository>,
    payment_events: Arc<dyn PaymentEventLedger>,
    ai_jobs: Arc<dyn AiJobRepository>,
    webhook_replays: Arc<dyn WebhookReplayStore>,
}

fn build_repository_set() -> RepositorySet {
    RepositorySet {
        audit_logs: Arc::new(InMemoryAuditLogRepository::new()),
        counters: Arc::new(InMemoryCounterRepository::new()),
        orders: Arc::new(InMemoryOrderRepository::new()),
        production_queues: Arc::new(InMemoryProductionQueueRepository::new()),
        payment_events: Arc::new(InMemoryPaymentEventLedger::new()),
        ai_jobs: Arc::new(InMemoryAiJobRepository::new()),
        webhook_replays: Arc::new(InMemoryWebhookReplayStore::new()),
    }
}

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let authenticator =
        StaticTokenAuthenticator::from_config(&config.admin_api_tokens, &config.service_api_tokens)?;
    if authenticator.is_empty() {
        tracing::warn!("no API tokens configured, authenticated routes will reject every request");
    }

    let repositories = build_repository_set();
    let depth_recorder: Arc<dyn QueueDepthRecorder> = Arc::new(TracingQueueDepthRecorder);

    let mut state = AppState::new(Arc::new(authenticator));
    state.audit_log_service = Some(AuditLogService::new(repositories.audit_logs));
    state.counter_service = Some(CounterService::new(repositories.counters));
    state.counter_allowed_scopes = Arc::new(config.counter_allowed_scopes.clone());
    state.order_service = Some(OrderService::new(repositories.orders.clone()));
    state.shipment_service = Some(ShipmentService::new(repositories.orders.clone()));
    state.payment_service = Some(PaymentService::new(
        repositories.orders.clone(),
        repositories.payment_events,
    ));
    state.production_queue_service = Some(
        ProductionQueueService::new(repositories.production_queues, repositories.orders)
            .with_sla(Duration::hours(config.production_queue_sla_hours))
            .with_depth_recorder(depth_recorder.clone()),
    );
    state.queue_depth_recorder = Some(depth_recorder);
    state.ai_job_service = Some(
        AiJobService::new(repositories.ai_jobs).with_notifier(Arc::new(TracingSuggestionNotifier)),
    );
    state.shipping_webhooks = Arc::new(config.shipping.clone());
    state.stripe_secret_fetcher = config
        .stripe_webhook_secret
        .as_deref()
        .map(|secret| -> Arc<dyn StripeSecretFetcher> {
            Arc::new(EnvStripeSecretFetcher::new(secret))
        });
    state.stripe_tolerance = Duration::seconds(config.stripe_tolerance_seconds);
    state.webhook_replay = Some(
        WebhookReplayGuard::new(repositories.webhook_replays)
            .with_ttl(Duration::seconds(config.webhook_replay_ttl_seconds)),
    );
    state.webhook_metrics = Some(Arc::new(TracingWebhookMetricsRecorder));

    Ok(state)
}
