//! Workspace membership entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A membership row binding a user reference to a workspace.
///
/// `user_ref` is either an account id rendered as its uuid string, or a bare
/// email address standing in for an invitee who has not registered yet. Rows
/// are never hard-deleted so historical references stay valid; leaving a
/// workspace sets `removed`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkspaceMember {
    /// The workspace this membership belongs to.
    pub workspace_id: Uuid,
    /// Account id string or email placeholder.
    pub user_ref: String,
    /// Whether the member administers the workspace.
    pub is_admin: bool,
    /// Soft-removal flag.
    pub removed: bool,
    /// When the member first joined.
    pub joined_at: DateTime<Utc>,
}

impl WorkspaceMember {
    /// Whether this row represents a current (non-removed) member.
    pub fn is_active(&self) -> bool {
        !self.removed
    }
}

/// Data for one row of a bulk membership insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkspaceMember {
    /// Account id string or email placeholder.
    pub user_ref: String,
    /// Target workspace.
    pub workspace_id: Uuid,
    /// Admin flag requested by the caller.
    pub is_admin: bool,
}
