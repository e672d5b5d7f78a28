use async_trait::async_trait;

use sealworks_application::StripeSecretFetcher;
use sealworks_core::{AppError, AppResult};

/// Serves the Stripe signing secret loaded from the environment at startup.
#[derive(Clone)]
pub struct EnvStripeSecretFetcher {
    secret: String,
}

impl EnvStripeSecretFetcher {
    /// Wraps a configured secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for EnvStripeSecretFetcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("EnvStripeSecretFetcher")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl StripeSecretFetcher for EnvStripeSecretFetcher {
    async fn signing_secret(&self) -> AppResult<String> {
        let secret = self.secret.trim();
        if secret.is_empty() {
            return Err(AppError::Unavailable(
                "stripe webhook secret is not configured".to_owned(),
            ));
        }

        Ok(secret.to_owned())
    }
}
