//! PII masking and actor classification used when building responses and audit entries.

use sealworks_core::{Identity, Role};

const MASK: &str = "***";

/// Masks an email address as `<first>***[<last>]@domain`.
///
/// Local parts of one character or less collapse to `***`.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    if email.is_empty() {
        return String::new();
    }

    let Some(at) = email.find('@').filter(|at| *at > 1) else {
        return MASK.to_owned();
    };
    let (local, domain) = (&email[..at], &email[at + 1..]);

    let mut chars = local.chars();
    let first = chars.next().map(String::from).unwrap_or_default();
    if domain.is_empty() {
        return format!("{first}{MASK}");
    }

    let last = match chars.next_back() {
        Some(last) if local.chars().count() > 2 => last.to_string(),
        _ => String::new(),
    };
    format!("{first}{MASK}{last}@{domain}")
}

/// Masks a phone number down to its last four characters.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let phone = phone.trim();
    if phone.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return MASK.to_owned();
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{MASK}{tail}")
}

/// Classifies the acting identity for audit entries.
///
/// Admin wins over staff; a lone other role uses its own name; anything else uses `fallback`.
#[must_use]
pub fn actor_type(identity: &Identity, fallback: &str) -> String {
    if identity.has_role(Role::Admin) {
        return Role::Admin.as_str().to_owned();
    }
    if identity.has_role(Role::Staff) {
        return Role::Staff.as_str().to_owned();
    }

    let mut roles = identity.roles().iter();
    match (roles.next(), roles.next()) {
        (Some(role), None) => role.as_str().to_owned(),
        _ => fallback.to_owned(),
    }
}
