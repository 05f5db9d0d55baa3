//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::AccountRole;

/// A registered account, belonging to exactly one school.
///
/// Existence of an account for an email address is what distinguishes a
/// direct workspace add from an invitation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// The school this account belongs to.
    pub school_id: Uuid,
    /// Email address (stored as provided; compared case-insensitively).
    pub email: String,
    /// School-level role.
    pub role: AccountRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The canonical reference string used to key membership rows.
    pub fn member_ref(&self) -> String {
        self.id.to_string()
    }
}

/// Data required to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// The school to register under.
    pub school_id: Uuid,
    /// Email address.
    pub email: String,
    /// Assigned role.
    pub role: AccountRole,
}
