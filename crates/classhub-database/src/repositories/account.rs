//! Account repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_entity::account::{Account, CreateAccount};

/// Write-side account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create a new account. Returns a conflict error if one already
    /// exists for (school_id, email).
    async fn create(&self, data: &CreateAccount) -> AppResult<Account>;
}

/// Repository for account CRUD and lookup operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an account by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by id", e)
            })
    }

    /// Find an account by email within a school (case-insensitive).
    pub async fn find_by_email(&self, school_id: Uuid, email: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE school_id = $1 AND LOWER(email) = LOWER($2)",
        )
        .bind(school_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account by email", e)
        })
    }

    /// Create a new account.
    async fn insert(&self, data: &CreateAccount) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (school_id, email, role) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(data.school_id)
        .bind(&data.email)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("accounts_school_email_key") =>
            {
                AppError::conflict(format!(
                    "An account already exists for '{}' in this school",
                    data.email
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create account", e),
        })
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn create(&self, data: &CreateAccount) -> AppResult<Account> {
        self.insert(data).await
    }
}
