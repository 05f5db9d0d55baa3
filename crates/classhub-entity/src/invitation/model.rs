//! Invitation entity model.

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::account::AccountRole;

/// A pending invitation for an email address to join a school.
///
/// At most one live invitation exists per (school, email), enforced by a
/// uniqueness constraint. Invitations are consumed when the invitee
/// registers, revoked explicitly, or swept once `expires_at` passes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    /// Unique invitation identifier.
    pub id: Uuid,
    /// The school the invitee would join.
    pub school_id: Uuid,
    /// Invited email address.
    pub email: String,
    /// Who issued the invitation: an account id string or a system name.
    pub invited_by: String,
    /// Role the invitee will receive on registration.
    pub role: AccountRole,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
    /// When the invitation stops being valid.
    pub expires_at: DateTime<Utc>,
    /// Last time the invitation was touched (e.g. re-sent).
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Whether the invitation is still live at the given instant.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Data required to persist a new invitation.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub school_id: Uuid,
    pub email: String,
    pub invited_by: String,
    pub role: AccountRole,
    pub expires_at: DateTime<Utc>,
}

/// Compute an invitation expiry: `days` from `now`, aligned to the end of
/// that UTC day (23:59:59.999).
pub fn expiry_at(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let target = now + chrono::Duration::days(days);
    let next_midnight = target
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| target.date_naive())
        .and_time(NaiveTime::MIN);
    (next_midnight - chrono::Duration::milliseconds(1)).and_utc()
}
