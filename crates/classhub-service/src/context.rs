//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use classhub_entity::account::AccountRole;

/// Context for the current authenticated request.
///
/// Extracted by the API layer and passed into service methods so that
/// every operation knows *who* is acting and under *which* school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated account's ID.
    pub account_id: Uuid,
    /// The school the account belongs to.
    pub school_id: Uuid,
    /// The account's role at the time the token was issued.
    pub role: AccountRole,
    /// The account email (convenience field from token claims).
    pub email: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(account_id: Uuid, school_id: Uuid, role: AccountRole, email: String) -> Self {
        Self {
            account_id,
            school_id,
            role,
            email,
            request_time: Utc::now(),
        }
    }

    /// The membership reference string for the calling account.
    pub fn member_ref(&self) -> String {
        self.account_id.to_string()
    }

    /// Whether the caller holds a role that may manage members.
    pub fn can_manage_members(&self) -> bool {
        self.role.can_manage_members()
    }
}
