use std::str::FromStr;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use sealworks_application::Authenticator;
use sealworks_core::{AppError, AppResult, Identity, Principal, Role, ServiceIdentity};

struct TokenEntry {
    token: String,
    principal: Principal,
}

/// Authenticator backed by tokens configured at startup.
///
/// Admin entries use `token=subject:role|role[:email]` and service entries use
/// `token=service-name`; both lists are comma separated.
pub struct StaticTokenAuthenticator {
    entries: Vec<TokenEntry>,
}

impl StaticTokenAuthenticator {
    /// Parses admin and service token lists.
    pub fn from_config(admin_tokens: &str, service_tokens: &str) -> AppResult<Self> {
        let mut entries = Vec::new();

        for raw in split_entries(admin_tokens) {
            let (token, grant) = split_token(raw, "ADMIN_API_TOKENS")?;
            let mut parts = grant.splitn(3, ':');
            let subject = parts.next().unwrap_or_default().trim();
            let roles = parts
                .next()
                .unwrap_or_default()
                .split('|')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(Role::from_str)
                .collect::<AppResult<Vec<_>>>()?;
            if roles.is_empty() {
                return Err(AppError::Validation(format!(
                    "ADMIN_API_TOKENS entry for '{subject}' must list at least one role"
                )));
            }
            let email = parts
                .next()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_owned);

            let identity = Identity::new(subject, None, email, roles)
                .map_err(|error| AppError::Validation(error.to_string()))?;
            entries.push(TokenEntry {
                token,
                principal: Principal::User(identity),
            });
        }

        for raw in split_entries(service_tokens) {
            let (token, name) = split_token(raw, "SERVICE_API_TOKENS")?;
            let service = ServiceIdentity::new(name)
                .map_err(|error| AppError::Validation(error.to_string()))?;
            entries.push(TokenEntry {
                token,
                principal: Principal::Service(service),
            });
        }

        Ok(Self { entries })
    }

    /// Returns the number of configured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no tokens are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<Option<Principal>> {
        let token = token.trim().as_bytes();
        if token.is_empty() {
            return Ok(None);
        }

        let mut matched = None;
        for entry in &self.entries {
            if bool::from(entry.token.as_bytes().ct_eq(token)) && matched.is_none() {
                matched = Some(entry.principal.clone());
            }
        }

        Ok(matched)
    }
}

fn split_entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

fn split_token<'a>(raw: &'a str, variable: &str) -> AppResult<(String, &'a str)> {
    let Some((token, rest)) = raw.split_once('=') else {
        return Err(AppError::Validation(format!(
            "{variable} entries must look like token=value"
        )));
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Validation(format!("{variable} has an empty token")));
    }

    Ok((token.to_owned(), rest.trim()))
}
