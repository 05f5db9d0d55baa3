//! Workspace membership repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_core::types::pagination::{PageRequest, PageResponse};
use classhub_entity::workspace::{NewWorkspaceMember, WorkspaceMember};

/// Persistence operations on workspace membership rows.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Find a membership row by (workspace, user reference).
    async fn find(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<Option<WorkspaceMember>>;

    /// Whether a non-removed membership row exists.
    async fn is_active_member(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool>;

    /// Bulk-insert membership rows in a single statement.
    ///
    /// Any uniqueness violation aborts the entire batch; callers must
    /// pre-filter to entries confirmed absent.
    async fn insert_many(&self, entries: &[NewWorkspaceMember]) -> AppResult<()>;

    /// Clear the removed flag on a row and overwrite its admin flag.
    async fn reactivate(&self, workspace_id: Uuid, user_ref: &str, is_admin: bool)
        -> AppResult<()>;

    /// Soft-remove a member. Returns `true` if a row was updated.
    async fn remove(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool>;

    /// Re-key email-placeholder rows to a registered account id. Returns the
    /// number of rows updated.
    async fn rekey(&self, email: &str, account_id: Uuid) -> AppResult<u64>;

    /// List active members of a workspace.
    async fn list(
        &self,
        workspace_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WorkspaceMember>>;
}

/// Repository for workspace membership rows.
#[derive(Debug, Clone)]
pub struct WorkspaceMemberRepository {
    pool: PgPool,
}

impl WorkspaceMemberRepository {
    /// Create a new workspace member repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for WorkspaceMemberRepository {
    async fn find(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<Option<WorkspaceMember>> {
        sqlx::query_as::<_, WorkspaceMember>(
            "SELECT * FROM workspace_members WHERE workspace_id = $1 AND user_ref = $2",
        )
        .bind(workspace_id)
        .bind(user_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find member", e))
    }

    async fn is_active_member(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workspace_members \
             WHERE workspace_id = $1 AND user_ref = $2 AND removed = FALSE",
        )
        .bind(workspace_id)
        .bind(user_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check membership", e)
        })?;

        Ok(count > 0)
    }

    async fn insert_many(&self, entries: &[NewWorkspaceMember]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let workspace_ids: Vec<Uuid> = entries.iter().map(|e| e.workspace_id).collect();
        let user_refs: Vec<String> = entries.iter().map(|e| e.user_ref.clone()).collect();
        let admin_flags: Vec<bool> = entries.iter().map(|e| e.is_admin).collect();

        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, user_ref, is_admin) \
             SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::bool[])",
        )
        .bind(&workspace_ids)
        .bind(&user_refs)
        .bind(&admin_flags)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // No per-row recovery: one duplicate aborts the whole insert.
            AppError::with_source(ErrorKind::Database, "Bulk membership insert failed", e)
        })?;

        Ok(())
    }

    async fn reactivate(
        &self,
        workspace_id: Uuid,
        user_ref: &str,
        is_admin: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE workspace_members SET removed = FALSE, is_admin = $3 \
             WHERE workspace_id = $1 AND user_ref = $2",
        )
        .bind(workspace_id)
        .bind(user_ref)
        .bind(is_admin)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reactivate member", e)
        })?;

        if result.rows_affected() == 0 {
            // Can legitimately happen under concurrent removal.
            warn!(
                workspace_id = %workspace_id,
                user_ref = %user_ref,
                "Reactivation matched no membership row"
            );
        }

        Ok(())
    }

    async fn remove(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE workspace_members SET removed = TRUE \
             WHERE workspace_id = $1 AND user_ref = $2 AND removed = FALSE",
        )
        .bind(workspace_id)
        .bind(user_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove member", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn rekey(&self, email: &str, account_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE workspace_members SET user_ref = $2 WHERE LOWER(user_ref) = LOWER($1)",
        )
        .bind(email)
        .bind(account_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to re-key memberships", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn list(
        &self,
        workspace_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WorkspaceMember>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workspace_members WHERE workspace_id = $1 AND removed = FALSE",
        )
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count members", e))?;

        let members = sqlx::query_as::<_, WorkspaceMember>(
            "SELECT * FROM workspace_members \
             WHERE workspace_id = $1 AND removed = FALSE \
             ORDER BY joined_at ASC LIMIT $2 OFFSET $3",
        )
        .bind(workspace_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list members", e))?;

        Ok(PageResponse::new(members, page, total as u64))
    }
}
