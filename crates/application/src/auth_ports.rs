use async_trait::async_trait;

use sealworks_core::{AppResult, Principal};

/// Port resolving bearer credentials into a caller principal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves a bearer token.
    ///
    /// Returns `Ok(None)` when the token is not recognised.
    async fn authenticate(&self, token: &str) -> AppResult<Option<Principal>>;
}
