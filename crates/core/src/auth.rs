use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Roles recognised by the admin surface.
///
/// Predicates are plain set membership; no role implies another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Operations staff.
    Staff,
    /// Regular storefront user.
    User,
    /// Machine caller.
    Service,
}

impl Role {
    /// Returns the stable transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
            Self::Service => "service",
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            "service" => Ok(Self::Service),
            other => Err(AppError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Authenticated human principal attached to admin requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
    display_name: Option<String>,
    email: Option<String>,
    roles: BTreeSet<Role>,
}

impl Identity {
    /// Creates an identity; the subject must be non-empty after trimming.
    pub fn new(
        subject: impl Into<String>,
        display_name: Option<String>,
        email: Option<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> AppResult<Self> {
        let subject = subject.into();
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AppError::Unauthorized(
                "identity subject must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            subject: subject.to_owned(),
            display_name: display_name
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            email: email
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            roles: roles.into_iter().collect(),
        })
    }

    /// Returns the stable subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name, if known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the roles in stable order.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns whether the identity carries `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns whether the identity carries at least one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }
}

/// Authenticated machine caller for internal endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    name: String,
}

impl ServiceIdentity {
    /// Creates a service identity; the name must be non-empty after trimming.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Unauthorized(
                "service identity name must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
        })
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Result of authenticating a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A human caller with roles.
    User(Identity),
    /// A machine caller.
    Service(ServiceIdentity),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Identity, Role, ServiceIdentity};

    fn staff() -> Identity {
        Identity::new("staff-1", None, None, [Role::Staff])
            .unwrap_or_else(|_| unreachable!("valid identity"))
    }

    #[test]
    fn identity_rejects_blank_subject() {
        assert!(Identity::new("   ", None, None, [Role::Admin]).is_err());
    }

    #[test]
    fn role_predicates_are_set_membership() {
        let identity = staff();
        assert!(identity.has_role(Role::Staff));
        assert!(!identity.has_role(Role::Admin));
        assert!(identity.has_any_role(&[Role::Admin, Role::Staff]));
        assert!(!identity.has_any_role(&[Role::Admin]));
        assert!(!identity.has_any_role(&[]));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::from_str(" ADMIN ").ok(), Some(Role::Admin));
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let identity = Identity::new("u1", Some("  ".to_owned()), Some("".to_owned()), [])
            .unwrap_or_else(|_| unreachable!("valid identity"));
        assert_eq!(identity.display_name(), None);
        assert_eq!(identity.email(), None);
    }

    #[test]
    fn service_identity_trims_name() {
        let service = ServiceIdentity::new("  checkout-worker ")
            .unwrap_or_else(|_| unreachable!("valid service"));
        assert_eq!(service.name(), "checkout-worker");
    }
}
