pub mod audit_logs;
mod audit_trail;
pub mod counters;
pub mod health;
pub mod orders;
pub mod production_queues;
#[cfg(test)]
pub(crate) mod test_support;
pub mod webhooks;
