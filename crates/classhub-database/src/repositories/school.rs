//! School repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_entity::school::School;

/// Repository for school lookups.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    pool: PgPool,
}

impl SchoolRepository {
    /// Create a new school repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a school by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<School>> {
        sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find school by id", e)
            })
    }
}
