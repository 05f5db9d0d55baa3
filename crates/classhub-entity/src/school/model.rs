//! School entity model and domain-restriction policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A school — the tenant boundary of the platform.
///
/// Every account and workspace belongs to exactly one school. A school may
/// carry an email domain restriction fixed at registration time; there is no
/// update path for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct School {
    /// Unique school identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional enforced email domain (e.g. `"@north.edu"`).
    pub email_domain: Option<String>,
    /// Whether the school has been deactivated.
    pub deactivated: bool,
    /// When the school was registered.
    pub created_at: DateTime<Utc>,
}

impl School {
    /// Whether the given email address is eligible under this school's
    /// domain restriction.
    ///
    /// No restriction means every address is eligible. With a restriction,
    /// eligibility is a case-sensitive suffix match. Note that account
    /// lookups elsewhere compare emails case-insensitively; this check
    /// intentionally does not (see DESIGN.md).
    pub fn permits_email(&self, email: &str) -> bool {
        match &self.email_domain {
            Some(domain) => email.ends_with(domain.as_str()),
            None => true,
        }
    }
}
