//! Invitation ledger service.
//!
//! Owns creation, uniqueness enforcement, and expiry of pending
//! invitations. The batch path reports a per-email outcome instead of
//! failing fast, and recovers from insert races on the (school, email)
//! uniqueness constraint.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::types::pagination::{PageRequest, PageResponse};
use classhub_database::repositories::{Directory, InvitationStore};
use classhub_entity::account::AccountRole;
use classhub_entity::invitation::{expiry_at, Invitation, NewInvitation};
use classhub_entity::school::School;

use crate::outcome::{InviteOutcome, MemberErrorCode};

/// Manages the invitation ledger for all schools.
#[derive(Clone)]
pub struct InvitationService {
    /// Read-side lookups (schools, accounts).
    directory: Arc<dyn Directory>,
    /// Invitation persistence.
    store: Arc<dyn InvitationStore>,
    /// Days until a new invitation expires (end-of-day aligned).
    expiry_days: i64,
}

impl InvitationService {
    /// Creates a new invitation service.
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn InvitationStore>,
        expiry_days: i64,
    ) -> Self {
        Self {
            directory,
            store,
            expiry_days,
        }
    }

    /// Create a single invitation.
    ///
    /// Fails with NotFound if the school is missing, Validation if the
    /// email is outside the school's domain restriction, and Conflict if
    /// an account or a live invitation already exists for the email.
    pub async fn create(
        &self,
        invited_by: &str,
        email: &str,
        role: AccountRole,
        school_id: Uuid,
    ) -> AppResult<Invitation> {
        let school = self.require_school(school_id).await?;

        if !school.permits_email(email) {
            return Err(AppError::validation(format!(
                "'{email}' is not permitted by the school's domain restriction"
            )));
        }

        if self
            .directory
            .find_account_by_email(school_id, email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "An account already exists for '{email}'"
            )));
        }

        let now = Utc::now();
        if self.store.find_live(school_id, email, now).await?.is_some() {
            return Err(AppError::conflict(format!(
                "An invitation already exists for '{email}'"
            )));
        }

        let invitation = self
            .store
            .insert(&NewInvitation {
                school_id,
                email: email.to_string(),
                invited_by: invited_by.to_string(),
                role,
                expires_at: expiry_at(now, self.expiry_days),
            })
            .await?;

        info!(
            school_id = %school_id,
            invitation_id = %invitation.id,
            email = %email,
            invited_by = %invited_by,
            "Invitation created"
        );

        Ok(invitation)
    }

    /// Create invitations for a batch of emails, reporting one outcome per
    /// distinct input email (order-preserving, first occurrence wins).
    ///
    /// Domain policy is the first and only check for ineligible emails;
    /// only eligible emails are checked for account and invitation
    /// existence. An insert race on the uniqueness constraint is downgraded
    /// to `INVITATION_ALREADY_EXISTS`; every other persistence failure
    /// aborts the batch.
    pub async fn create_batch(
        &self,
        invited_by: &str,
        emails: &[String],
        role: AccountRole,
        school_id: Uuid,
    ) -> AppResult<Vec<InviteOutcome>> {
        let school = self.require_school(school_id).await?;

        let mut outcomes = Vec::new();
        let mut seen = HashSet::new();

        for email in emails {
            if !seen.insert(email.clone()) {
                continue;
            }
            let outcome = self
                .create_one_of_batch(&school, invited_by, email, role)
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn create_one_of_batch(
        &self,
        school: &School,
        invited_by: &str,
        email: &str,
        role: AccountRole,
    ) -> AppResult<InviteOutcome> {
        if !school.permits_email(email) {
            return Ok(InviteOutcome::rejected(
                email,
                MemberErrorCode::DomainPolicyViolation,
            ));
        }

        if self
            .directory
            .find_account_by_email(school.id, email)
            .await?
            .is_some()
        {
            return Ok(InviteOutcome::rejected(
                email,
                MemberErrorCode::AccountAlreadyExists,
            ));
        }

        let now = Utc::now();
        if self.store.find_live(school.id, email, now).await?.is_some() {
            return Ok(InviteOutcome::rejected(
                email,
                MemberErrorCode::InvitationAlreadyExists,
            ));
        }

        match self
            .store
            .insert(&NewInvitation {
                school_id: school.id,
                email: email.to_string(),
                invited_by: invited_by.to_string(),
                role,
                expires_at: expiry_at(now, self.expiry_days),
            })
            .await
        {
            Ok(invitation) => Ok(InviteOutcome::inserted(email, invitation.id)),
            Err(e) if e.is_conflict() => {
                // Lost the race between the existence check and the insert;
                // the caller's intent is still satisfied by the winner's row.
                warn!(
                    school_id = %school.id,
                    email = %email,
                    "Invitation insert lost a uniqueness race"
                );
                Ok(InviteOutcome::rejected(
                    email,
                    MemberErrorCode::InvitationAlreadyExists,
                ))
            }
            Err(e) => {
                error!(
                    school_id = %school.id,
                    email = %email,
                    error = %e,
                    "Invitation batch insert failed"
                );
                Err(e)
            }
        }
    }

    /// Find the live invitation for an email, if any.
    pub async fn live_invitation(
        &self,
        school_id: Uuid,
        email: &str,
    ) -> AppResult<Option<Invitation>> {
        self.store.find_live(school_id, email, Utc::now()).await
    }

    /// Consume all invitations for an email within a school.
    ///
    /// Called once an account is created under that email. Idempotent:
    /// deleting zero rows is not an error.
    pub async fn consume(&self, school_id: Uuid, email: &str) -> AppResult<u64> {
        let removed = self.store.delete_for_email(school_id, email).await?;
        if removed > 0 {
            info!(
                school_id = %school_id,
                email = %email,
                removed,
                "Invitations consumed"
            );
        }
        Ok(removed)
    }

    /// Explicitly revoke an invitation by id.
    pub async fn revoke(&self, school_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.store.delete_by_id(school_id, id).await? {
            return Err(AppError::not_found("Invitation not found"));
        }
        info!(school_id = %school_id, invitation_id = %id, "Invitation revoked");
        Ok(())
    }

    /// Delete invitations past their expiry. Returns the number swept.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let swept = self.store.delete_expired(Utc::now()).await?;
        if swept > 0 {
            info!(swept, "Expired invitations swept");
        }
        Ok(swept)
    }

    /// List invitations for a school.
    pub async fn list(
        &self,
        school_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Invitation>> {
        self.store.list_by_school(school_id, page).await
    }

    async fn require_school(&self, school_id: Uuid) -> AppResult<School> {
        self.directory
            .find_school(school_id)
            .await?
            .ok_or_else(|| AppError::not_found("School not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryDirectory, MemoryInvitationStore};
    use classhub_core::error::ErrorKind;

    fn service(
        directory: Arc<MemoryDirectory>,
        store: Arc<MemoryInvitationStore>,
    ) -> InvitationService {
        InvitationService::new(directory, store, 7)
    }

    #[tokio::test]
    async fn test_create_rejects_missing_school() {
        let directory = Arc::new(MemoryDirectory::default());
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let err = svc
            .create("system", "kid@north.edu", AccountRole::Student, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_rejects_domain_violation() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(Some("@north.edu"));
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let err = svc
            .create("system", "kid@south.edu", AccountRole::Student, school)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_rejects_existing_account() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        directory.add_account(school, "kid@north.edu", AccountRole::Student);
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let err = svc
            .create("system", "kid@north.edu", AccountRole::Student, school)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_create_sets_end_of_day_expiry() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let invitation = svc
            .create("system", "kid@north.edu", AccountRole::Student, school)
            .await
            .unwrap();

        let expected_date = (Utc::now() + chrono::Duration::days(7)).date_naive();
        assert_eq!(invitation.expires_at.date_naive(), expected_date);
        assert_eq!(
            invitation.expires_at.time(),
            chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_batch_dedupes_and_orders() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let emails = vec![
            "a@x.edu".to_string(),
            "b@x.edu".to_string(),
            "a@x.edu".to_string(),
        ];
        let outcomes = svc
            .create_batch("system", &emails, AccountRole::Student, school)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].email, "a@x.edu");
        assert_eq!(outcomes[1].email, "b@x.edu");
        assert!(outcomes.iter().all(|o| o.inserted));
    }

    #[tokio::test]
    async fn test_create_batch_domain_gate_first() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(Some("@x.edu"));
        // An account exists for the off-domain email; the outcome must
        // still be the domain violation.
        directory.add_account(school, "b@y.com", AccountRole::Student);
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store.clone());

        let outcomes = svc
            .create_batch(
                "system",
                &["b@y.com".to_string()],
                AccountRole::Student,
                school,
            )
            .await
            .unwrap();

        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::DomainPolicyViolation)
        );
        assert_eq!(store.lookup_count(), 0, "ineligible email must not be looked up");
    }

    #[tokio::test]
    async fn test_create_batch_reports_existing_account_and_invitation() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        directory.add_account(school, "has-account@x.edu", AccountRole::Student);
        let store = Arc::new(MemoryInvitationStore::default());
        store.add_live(school, "has-invite@x.edu");
        let svc = service(directory, store);

        let emails = vec![
            "has-account@x.edu".to_string(),
            "has-invite@x.edu".to_string(),
            "fresh@x.edu".to_string(),
        ];
        let outcomes = svc
            .create_batch("system", &emails, AccountRole::Student, school)
            .await
            .unwrap();

        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::AccountAlreadyExists)
        );
        assert_eq!(
            outcomes[1].error_code,
            Some(MemberErrorCode::InvitationAlreadyExists)
        );
        assert!(outcomes[2].inserted);
        assert!(outcomes[2].id.is_some());
    }

    #[tokio::test]
    async fn test_create_batch_downgrades_insert_race() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        let store = Arc::new(MemoryInvitationStore::default());
        // Simulate a concurrent writer winning between check and insert.
        store.conflict_on_insert("raced@x.edu");
        let svc = service(directory, store);

        let outcomes = svc
            .create_batch(
                "system",
                &["raced@x.edu".to_string()],
                AccountRole::Student,
                school,
            )
            .await
            .unwrap();

        assert!(!outcomes[0].inserted);
        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::InvitationAlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_consume_is_idempotent() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        let store = Arc::new(MemoryInvitationStore::default());
        store.add_live(school, "kid@x.edu");
        let svc = service(directory, store);

        assert_eq!(svc.consume(school, "kid@x.edu").await.unwrap(), 1);
        assert_eq!(svc.consume(school, "kid@x.edu").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_revoke_missing_is_not_found() {
        let directory = Arc::new(MemoryDirectory::default());
        let school = directory.add_school(None);
        let store = Arc::new(MemoryInvitationStore::default());
        let svc = service(directory, store);

        let err = svc.revoke(school, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
