use std::collections::BTreeSet;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use ipnet::IpNet;
use sealworks_application::{DEFAULT_QUEUE_SLA_HOURS, DEFAULT_REPLAY_TTL_SECONDS};
use sealworks_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_STRIPE_TOLERANCE_SECONDS: i64 = 300;

/// Per-carrier credentials for the shipping webhook ingress.
#[derive(Clone, Default)]
pub struct ShippingWebhookSettings {
    pub dhl_hmac_secret: Option<String>,
    pub ups_hmac_secret: Option<String>,
    pub yamato_token: Option<String>,
    pub fedex_token: Option<String>,
    pub jppost_allowed_cidrs: Vec<IpNet>,
}

impl std::fmt::Debug for ShippingWebhookSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ShippingWebhookSettings")
            .field("dhl_hmac_secret", &self.dhl_hmac_secret.is_some())
            .field("ups_hmac_secret", &self.ups_hmac_secret.is_some())
            .field("yamato_token", &self.yamato_token.is_some())
            .field("fedex_token", &self.fedex_token.is_some())
            .field("jppost_allowed_cidrs", &self.jppost_allowed_cidrs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub admin_console_url: String,
    pub admin_api_tokens: String,
    pub service_api_tokens: String,
    pub counter_allowed_scopes: BTreeSet<String>,
    pub shipping: ShippingWebhookSettings,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_tolerance_seconds: i64,
    pub webhook_replay_ttl_seconds: i64,
    pub production_queue_sla_hours: i64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let admin_console_url =
            env::var("ADMIN_CONSOLE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let stripe_tolerance_seconds = optional_env("STRIPE_WEBHOOK_TOLERANCE_SECONDS")
            .map(|value| parse_positive("STRIPE_WEBHOOK_TOLERANCE_SECONDS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_STRIPE_TOLERANCE_SECONDS);
        let webhook_replay_ttl_seconds = optional_env("WEBHOOK_REPLAY_TTL_SECONDS")
            .map(|value| parse_positive("WEBHOOK_REPLAY_TTL_SECONDS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_REPLAY_TTL_SECONDS);
        let production_queue_sla_hours = optional_env("PRODUCTION_QUEUE_SLA_HOURS")
            .map(|value| parse_positive("PRODUCTION_QUEUE_SLA_HOURS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_QUEUE_SLA_HOURS);

        Ok(Self {
            api_host,
            api_port,
            admin_console_url,
            admin_api_tokens: env::var("ADMIN_API_TOKENS").unwrap_or_default(),
            service_api_tokens: env::var("SERVICE_API_TOKENS").unwrap_or_default(),
            counter_allowed_scopes: parse_scope_list(
                &env::var("COUNTER_ALLOWED_SCOPES").unwrap_or_default(),
            ),
            shipping: ShippingWebhookSettings {
                dhl_hmac_secret: optional_env("SHIPPING_DHL_HMAC_SECRET"),
                ups_hmac_secret: optional_env("SHIPPING_UPS_HMAC_SECRET"),
                yamato_token: optional_env("SHIPPING_YAMATO_TOKEN"),
                fedex_token: optional_env("SHIPPING_FEDEX_TOKEN"),
                jppost_allowed_cidrs: parse_cidr_list(
                    &env::var("SHIPPING_JPPOST_ALLOWED_CIDRS").unwrap_or_default(),
                )?,
            },
            stripe_webhook_secret: optional_env("STRIPE_WEBHOOK_SECRET"),
            stripe_tolerance_seconds,
            webhook_replay_ttl_seconds,
            production_queue_sla_hours,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_positive(name: &str, value: &str) -> Result<i64, AppError> {
    match value.parse::<i64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(AppError::Validation(format!(
            "{name} must be a positive integer, got '{value}'"
        ))),
    }
}

/// Lowercased, de-duplicated scopes; an empty set allows every scope.
pub(crate) fn parse_scope_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|scope| scope.trim().to_ascii_lowercase())
        .filter(|scope| !scope.is_empty())
        .collect()
}

pub(crate) fn parse_cidr_list(raw: &str) -> Result<Vec<IpNet>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            IpNet::from_str(entry).or_else(|_| {
                IpAddr::from_str(entry).map(IpNet::from).map_err(|error| {
                    AppError::Validation(format!(
                        "invalid SHIPPING_JPPOST_ALLOWED_CIDRS entry '{entry}': {error}"
                    ))
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_cidr_list, parse_positive, parse_scope_list};

    #[test]
    fn scope_list_is_lowercased_and_deduplicated() {
        let scopes = parse_scope_list(" Orders ,invoices,, orders");
        assert_eq!(
            scopes.into_iter().collect::<Vec<_>>(),
            vec!["invoices".to_owned(), "orders".to_owned()]
        );
    }

    #[test]
    fn cidr_list_accepts_networks_and_bare_addresses() {
        let networks = parse_cidr_list("203.0.113.0/24, 198.51.100.7").unwrap_or_default();
        assert_eq!(networks.len(), 2);
        assert!(parse_cidr_list("not-a-network").is_err());
        assert!(parse_cidr_list("").unwrap_or_default().is_empty());
    }

    #[test]
    fn positive_values_are_required() {
        assert_eq!(parse_positive("X", "300").unwrap_or_default(), 300);
        assert!(parse_positive("X", "0").is_err());
        assert!(parse_positive("X", "five").is_err());
    }
}
