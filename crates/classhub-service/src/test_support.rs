//! In-memory store and notifier substitutes for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_core::types::pagination::{PageRequest, PageResponse};
use classhub_database::repositories::{AccountStore, Directory, InvitationStore, MembershipStore};
use classhub_entity::account::{Account, AccountRole, CreateAccount};
use classhub_entity::invitation::{expiry_at, Invitation, NewInvitation};
use classhub_entity::school::School;
use classhub_entity::workspace::{NewWorkspaceMember, Workspace, WorkspaceMember};

use crate::notification::{NotifiedMember, Notifier};

/// In-memory [`Directory`].
#[derive(Default)]
pub struct MemoryDirectory {
    schools: Mutex<HashMap<Uuid, School>>,
    workspaces: Mutex<HashMap<Uuid, Workspace>>,
    accounts: Mutex<Vec<Account>>,
    /// Emails whose account is invisible for their first lookup, to
    /// simulate a writer racing in between two reads.
    skip_first_lookup: Mutex<HashSet<String>>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryDirectory {
    pub fn add_school(&self, domain: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.schools.lock().unwrap().insert(
            id,
            School {
                id,
                name: "Test School".to_string(),
                email_domain: domain.map(String::from),
                deactivated: false,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn deactivate_school(&self, id: Uuid) {
        if let Some(school) = self.schools.lock().unwrap().get_mut(&id) {
            school.deactivated = true;
        }
    }

    pub fn add_workspace(&self, school_id: Uuid, archived: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.workspaces.lock().unwrap().insert(
            id,
            Workspace {
                id,
                school_id,
                name: "Test Workspace".to_string(),
                archived,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_account(&self, school_id: Uuid, email: &str, role: AccountRole) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.lock().unwrap().push(Account {
            id,
            school_id,
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        });
        id
    }

    /// Add an account that the first lookup of its email will miss.
    pub fn add_account_after_first_lookup(
        &self,
        school_id: Uuid,
        email: &str,
        role: AccountRole,
    ) -> Uuid {
        let id = self.add_account(school_id, email, role);
        self.skip_first_lookup
            .lock()
            .unwrap()
            .insert(email.to_string());
        id
    }

    /// Emails that have been looked up so far.
    pub fn account_lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_school(&self, id: Uuid) -> AppResult<Option<School>> {
        Ok(self.schools.lock().unwrap().get(&id).cloned())
    }

    async fn find_workspace(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        Ok(self.workspaces.lock().unwrap().get(&id).cloned())
    }

    async fn find_account_by_email(
        &self,
        school_id: Uuid,
        email: &str,
    ) -> AppResult<Option<Account>> {
        self.lookups.lock().unwrap().push(email.to_string());
        if self.skip_first_lookup.lock().unwrap().remove(email) {
            return Ok(None);
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.school_id == school_id && a.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

/// In-memory [`AccountStore`].
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, data: &CreateAccount) -> AppResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .iter()
            .any(|a| a.school_id == data.school_id && a.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(AppError::conflict(format!(
                "An account already exists for '{}' in this school",
                data.email
            )));
        }
        let account = Account {
            id: Uuid::new_v4(),
            school_id: data.school_id,
            email: data.email.clone(),
            role: data.role,
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        Ok(account)
    }
}

/// In-memory [`InvitationStore`].
#[derive(Default)]
pub struct MemoryInvitationStore {
    rows: Mutex<Vec<Invitation>>,
    conflicts: Mutex<HashSet<String>>,
    lookups: Mutex<usize>,
}

impl MemoryInvitationStore {
    /// Seed a live invitation.
    pub fn add_live(&self, school_id: Uuid, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.rows.lock().unwrap().push(Invitation {
            id,
            school_id,
            email: email.to_string(),
            invited_by: "system".to_string(),
            role: AccountRole::Student,
            created_at: now,
            expires_at: expiry_at(now, 7),
            last_updated_at: None,
        });
        id
    }

    /// Make the next insert for this email fail with a uniqueness conflict
    /// even though no row is visible, simulating a lost race.
    pub fn conflict_on_insert(&self, email: &str) {
        self.conflicts.lock().unwrap().insert(email.to_string());
    }

    /// Number of live-invitation lookups performed.
    pub fn lookup_count(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    /// All stored rows.
    pub fn rows(&self) -> Vec<Invitation> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvitationStore for MemoryInvitationStore {
    async fn find_live(
        &self,
        school_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.school_id == school_id && i.email == email && i.expires_at > now)
            .cloned())
    }

    async fn insert(&self, data: &NewInvitation) -> AppResult<Invitation> {
        if self.conflicts.lock().unwrap().remove(&data.email) {
            return Err(AppError::conflict(format!(
                "An invitation already exists for '{}' in this school",
                data.email
            )));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|i| i.school_id == data.school_id && i.email == data.email)
        {
            return Err(AppError::conflict(format!(
                "An invitation already exists for '{}' in this school",
                data.email
            )));
        }
        let invitation = Invitation {
            id: Uuid::new_v4(),
            school_id: data.school_id,
            email: data.email.clone(),
            invited_by: data.invited_by.clone(),
            role: data.role,
            created_at: Utc::now(),
            expires_at: data.expires_at,
            last_updated_at: None,
        };
        rows.push(invitation.clone());
        Ok(invitation)
    }

    async fn delete_for_email(&self, school_id: Uuid, email: &str) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| !(i.school_id == school_id && i.email.eq_ignore_ascii_case(email)));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_id(&self, school_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| !(i.school_id == school_id && i.id == id));
        Ok(rows.len() < before)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.expires_at > now);
        Ok((before - rows.len()) as u64)
    }

    async fn list_by_school(
        &self,
        school_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Invitation>> {
        let rows = self.rows.lock().unwrap();
        let matching: Vec<Invitation> = rows
            .iter()
            .filter(|i| i.school_id == school_id)
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }
}

/// In-memory [`MembershipStore`].
#[derive(Default)]
pub struct MemoryMembershipStore {
    rows: Mutex<HashMap<(Uuid, String), WorkspaceMember>>,
    inserted: Mutex<usize>,
}

impl MemoryMembershipStore {
    /// Seed a membership row.
    pub fn add_member(&self, workspace_id: Uuid, user_ref: &str, is_admin: bool, removed: bool) {
        self.rows.lock().unwrap().insert(
            (workspace_id, user_ref.to_string()),
            WorkspaceMember {
                workspace_id,
                user_ref: user_ref.to_string(),
                is_admin,
                removed,
                joined_at: Utc::now(),
            },
        );
    }

    /// Fetch a row by key.
    pub fn get(&self, workspace_id: Uuid, user_ref: &str) -> Option<WorkspaceMember> {
        self.rows
            .lock()
            .unwrap()
            .get(&(workspace_id, user_ref.to_string()))
            .cloned()
    }

    /// Rows inserted through `insert_many`.
    pub fn insert_count(&self) -> usize {
        *self.inserted.lock().unwrap()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn find(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<Option<WorkspaceMember>> {
        Ok(self.get(workspace_id, user_ref))
    }

    async fn is_active_member(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        Ok(self
            .get(workspace_id, user_ref)
            .map(|m| !m.removed)
            .unwrap_or(false))
    }

    async fn insert_many(&self, entries: &[NewWorkspaceMember]) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        // All-or-nothing, like the single-statement bulk insert.
        for entry in entries {
            if rows.contains_key(&(entry.workspace_id, entry.user_ref.clone())) {
                return Err(AppError::new(
                    ErrorKind::Database,
                    "Bulk membership insert failed",
                ));
            }
        }
        for entry in entries {
            rows.insert(
                (entry.workspace_id, entry.user_ref.clone()),
                WorkspaceMember {
                    workspace_id: entry.workspace_id,
                    user_ref: entry.user_ref.clone(),
                    is_admin: entry.is_admin,
                    removed: false,
                    joined_at: Utc::now(),
                },
            );
        }
        *self.inserted.lock().unwrap() += entries.len();
        Ok(())
    }

    async fn reactivate(
        &self,
        workspace_id: Uuid,
        user_ref: &str,
        is_admin: bool,
    ) -> AppResult<()> {
        if let Some(member) = self
            .rows
            .lock()
            .unwrap()
            .get_mut(&(workspace_id, user_ref.to_string()))
        {
            member.removed = false;
            member.is_admin = is_admin;
        }
        Ok(())
    }

    async fn remove(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        if let Some(member) = self
            .rows
            .lock()
            .unwrap()
            .get_mut(&(workspace_id, user_ref.to_string()))
        {
            if !member.removed {
                member.removed = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn rekey(&self, email: &str, account_id: Uuid) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let keys: Vec<(Uuid, String)> = rows
            .keys()
            .filter(|(_, user_ref)| user_ref.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        let count = keys.len() as u64;
        for key in keys {
            if let Some(mut member) = rows.remove(&key) {
                member.user_ref = account_id.to_string();
                rows.insert((key.0, account_id.to_string()), member);
            }
        }
        Ok(count)
    }

    async fn list(
        &self,
        workspace_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WorkspaceMember>> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<WorkspaceMember> = rows
            .values()
            .filter(|m| m.workspace_id == workspace_id && !m.removed)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.joined_at);
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }
}

/// [`Notifier`] that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Uuid, Uuid, Vec<NotifiedMember>)>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    /// Make the next send fail.
    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Recorded calls as (actor, workspace, members).
    pub fn calls(&self) -> Vec<(Uuid, Uuid, Vec<NotifiedMember>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_bulk_workspace_invite(
        &self,
        actor_id: Uuid,
        workspace: &Workspace,
        members: &[NotifiedMember],
    ) -> AppResult<()> {
        if std::mem::take(&mut *self.fail.lock().unwrap()) {
            return Err(AppError::external_service("Mail delivery failed"));
        }
        self.calls
            .lock()
            .unwrap()
            .push((actor_id, workspace.id, members.to_vec()));
        Ok(())
    }
}
