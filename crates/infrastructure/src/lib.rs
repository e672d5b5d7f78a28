//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod env_stripe_secret_fetcher;
mod in_memory_ai_job_repository;
mod in_memory_audit_log_repository;
mod in_memory_counter_repository;
mod in_memory_order_repository;
mod in_memory_payment_event_ledger;
mod in_memory_production_queue_repository;
mod in_memory_webhook_replay_store;
mod page_cursor;
mod static_token_authenticator;
#[cfg(test)]
mod test_fixtures;
mod tracing_queue_depth_recorder;
mod tracing_suggestion_notifier;
mod tracing_webhook_metrics_recorder;

pub use env_stripe_secret_fetcher::EnvStripeSecretFetcher;
pub use in_memory_ai_job_repository::InMemoryAiJobRepository;
pub use in_memory_audit_log_repository::InMemoryAuditLogRepository;
pub use in_memory_counter_repository::InMemoryCounterRepository;
pub use in_memory_order_repository::InMemoryOrderRepository;
pub use in_memory_payment_event_ledger::InMemoryPaymentEventLedger;
pub use in_memory_production_queue_repository::InMemoryProductionQueueRepository;
pub use in_memory_webhook_replay_store::InMemoryWebhookReplayStore;
pub use static_token_authenticator::StaticTokenAuthenticator;
pub use tracing_queue_depth_recorder::TracingQueueDepthRecorder;
pub use tracing_suggestion_notifier::TracingSuggestionNotifier;
pub use tracing_webhook_metrics_recorder::TracingWebhookMetricsRecorder;
