//! Workspace entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A workspace — a class or club inside one school.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workspace {
    /// Unique workspace identifier.
    pub id: Uuid,
    /// The school this workspace belongs to.
    pub school_id: Uuid,
    /// Display name.
    pub name: String,
    /// Archived workspaces refuse membership changes.
    pub archived: bool,
    /// When the workspace was created.
    pub created_at: DateTime<Utc>,
}
