//! Invitation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_core::types::pagination::{PageRequest, PageResponse};
use classhub_entity::invitation::{Invitation, NewInvitation};

/// Persistence operations on the invitation ledger.
///
/// The uniqueness constraint on (school_id, email) is the only guard against
/// two concurrent writers inviting the same address; [`InvitationStore::insert`]
/// surfaces that violation as a conflict so callers can recover.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Find a live (non-expired) invitation for an email within a school.
    async fn find_live(
        &self,
        school_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>>;

    /// Persist a new invitation. Returns a conflict error if a row already
    /// exists for (school_id, email).
    async fn insert(&self, data: &NewInvitation) -> AppResult<Invitation>;

    /// Delete all invitations for an email within a school. Returns the
    /// number of rows removed; deleting zero rows is not an error.
    async fn delete_for_email(&self, school_id: Uuid, email: &str) -> AppResult<u64>;

    /// Delete a single invitation by id. Returns `true` if a row was removed.
    async fn delete_by_id(&self, school_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Delete every invitation past its expiry. Returns the number swept.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// List invitations for a school, newest first.
    async fn list_by_school(
        &self,
        school_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Invitation>>;
}

/// Repository for invitation persistence.
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn find_live(
        &self,
        school_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE school_id = $1 AND email = $2 AND expires_at > $3",
        )
        .bind(school_id)
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find live invitation", e)
        })
    }

    async fn insert(&self, data: &NewInvitation) -> AppResult<Invitation> {
        sqlx::query_as::<_, Invitation>(
            "INSERT INTO invitations (school_id, email, invited_by, role, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(data.school_id)
        .bind(&data.email)
        .bind(&data.invited_by)
        .bind(data.role)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("invitations_school_id_email_key") =>
            {
                AppError::conflict(format!(
                    "An invitation already exists for '{}' in this school",
                    data.email
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create invitation", e),
        })
    }

    async fn delete_for_email(&self, school_id: Uuid, email: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM invitations WHERE school_id = $1 AND LOWER(email) = LOWER($2)",
        )
        .bind(school_id)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete invitations", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, school_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM invitations WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete invitation", e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM invitations WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to sweep invitations", e)
            })?;

        Ok(result.rows_affected())
    }

    async fn list_by_school(
        &self,
        school_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Invitation>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invitations WHERE school_id = $1")
                .bind(school_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count invitations", e)
                })?;

        let invitations = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE school_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(school_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list invitations", e)
        })?;

        Ok(PageResponse::new(invitations, page, total as u64))
    }
}
