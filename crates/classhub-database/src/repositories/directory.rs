//! Read-only directory lookups used by the invitation and membership flows.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use classhub_core::result::AppResult;
use classhub_entity::account::Account;
use classhub_entity::school::School;
use classhub_entity::workspace::Workspace;

use super::account::AccountRepository;
use super::school::SchoolRepository;
use super::workspace::WorkspaceRepository;

/// Read-side lookups of schools, workspaces, and accounts.
///
/// The service layer depends on this trait rather than on concrete
/// repositories so tests can substitute an in-memory directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a school by id.
    async fn find_school(&self, id: Uuid) -> AppResult<Option<School>>;

    /// Look up a workspace by id.
    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>>;

    /// Look up an account by email within a school. Email comparison is
    /// normalized (case-insensitive equality).
    async fn find_account_by_email(
        &self,
        school_id: Uuid,
        email: &str,
    ) -> AppResult<Option<Account>>;
}

/// Production [`Directory`] backed by the entity repositories.
#[derive(Debug, Clone)]
pub struct DbDirectory {
    schools: Arc<SchoolRepository>,
    workspaces: Arc<WorkspaceRepository>,
    accounts: Arc<AccountRepository>,
}

impl DbDirectory {
    /// Create a new database-backed directory.
    pub fn new(
        schools: Arc<SchoolRepository>,
        workspaces: Arc<WorkspaceRepository>,
        accounts: Arc<AccountRepository>,
    ) -> Self {
        Self {
            schools,
            workspaces,
            accounts,
        }
    }
}

#[async_trait]
impl Directory for DbDirectory {
    async fn find_school(&self, id: Uuid) -> AppResult<Option<School>> {
        self.schools.find_by_id(id).await
    }

    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        self.workspaces.find_by_id(id).await
    }

    async fn find_account_by_email(
        &self,
        school_id: Uuid,
        email: &str,
    ) -> AppResult<Option<Account>> {
        self.accounts.find_by_email(school_id, email).await
    }
}
