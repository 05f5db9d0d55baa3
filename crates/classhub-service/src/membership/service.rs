//! Workspace membership service — the bulk-add reconciliation engine.
//!
//! For an arbitrary batch of candidate emails the engine classifies each
//! into {already-a-member, removed-member-to-reactivate, needs-invitation,
//! blocked-by-domain-policy}, performs the corresponding mutation, and
//! returns one outcome per distinct input email.
//!
//! The mutation passes run in a fixed order — invitations, then the bulk
//! membership insert, then reactivations — because the invitation results
//! decide which placeholder rows the insert carries. There is no
//! transactional envelope across the passes: each commits independently,
//! and a fatal error after a committed pass leaves its mutations in place.

use std::sync::Arc;

use futures::future;
use tracing::info;
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::types::pagination::{PageRequest, PageResponse};
use classhub_database::repositories::{Directory, MembershipStore};
use classhub_entity::account::AccountRole;
use classhub_entity::school::School;
use classhub_entity::workspace::{NewWorkspaceMember, Workspace, WorkspaceMember};

use crate::invitation::InvitationService;
use crate::membership::plan::{self, CandidateState, Step};
use crate::notification::{NotifiedMember, Notifier};
use crate::outcome::{MemberCandidate, MemberErrorCode, MemberOutcome};

/// Orchestrates workspace membership changes.
#[derive(Clone)]
pub struct MembershipService {
    /// Read-side lookups (workspaces, schools, accounts).
    directory: Arc<dyn Directory>,
    /// Membership persistence.
    members: Arc<dyn MembershipStore>,
    /// The invitation ledger.
    invitations: Arc<InvitationService>,
    /// Notification dispatch for added members.
    notifier: Arc<dyn Notifier>,
}

impl MembershipService {
    /// Creates a new membership service.
    pub fn new(
        directory: Arc<dyn Directory>,
        members: Arc<dyn MembershipStore>,
        invitations: Arc<InvitationService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            members,
            invitations,
            notifier,
        }
    }

    /// Reconcile a batch of candidate members against one workspace.
    ///
    /// Candidates are deduplicated by email (first occurrence wins, later
    /// duplicates are dropped from the result entirely). Per-candidate
    /// failures never abort the batch; a missing workspace or school, a
    /// failed bulk insert, or a notifier failure aborts the whole call and
    /// no partial outcome list is returned.
    pub async fn add_members_bulk(
        &self,
        actor_id: Uuid,
        workspace_id: Uuid,
        candidates: Vec<MemberCandidate>,
    ) -> AppResult<Vec<MemberOutcome>> {
        let workspace = self.require_workspace(workspace_id).await?;
        let school = self
            .directory
            .find_school(workspace.school_id)
            .await?
            .ok_or_else(|| AppError::not_found("School not found"))?;

        let distinct = plan::dedupe_candidates(candidates);

        // Read-only preflight; all lookups run concurrently and the engine
        // waits for every one before mutating anything.
        let checks = distinct
            .iter()
            .map(|c| self.preflight(&school, workspace_id, c));
        let steps = future::try_join_all(checks).await?;

        let mut states: Vec<CandidateState> = distinct
            .into_iter()
            .zip(steps)
            .map(|(candidate, step)| CandidateState::new(candidate, step))
            .collect();

        // Pass 1 — invitation sub-batch for candidates without an account.
        let invite_emails: Vec<String> = states
            .iter()
            .filter(|s| s.step == Step::Invite)
            .map(|s| s.email.clone())
            .collect();
        if !invite_emails.is_empty() {
            let results = self
                .invitations
                .create_batch(
                    &actor_id.to_string(),
                    &invite_emails,
                    AccountRole::Student,
                    workspace.school_id,
                )
                .await?;
            plan::apply_invite_outcomes(&mut states, &results);
        }

        // Pass 2 — one bulk insert for every direct add, including the
        // email-keyed placeholder rows produced by pass 1.
        let inserts: Vec<NewWorkspaceMember> = states
            .iter()
            .filter_map(|s| match &s.step {
                Step::DirectAdd { user_ref } => Some(NewWorkspaceMember {
                    user_ref: user_ref.clone(),
                    workspace_id,
                    is_admin: s.is_admin,
                }),
                _ => None,
            })
            .collect();
        if !inserts.is_empty() {
            self.members.insert_many(&inserts).await?;
        }
        for state in &mut states {
            if matches!(state.step, Step::DirectAdd { .. }) {
                state.step = Step::Added { unremove: false };
            }
        }

        // Pass 3 — per-row reactivations. The requested admin flag always
        // overwrites the stored one.
        for state in &mut states {
            if let Step::Reactivate { user_ref } = &state.step {
                self.members
                    .reactivate(workspace_id, user_ref, state.is_admin)
                    .await?;
                state.step = Step::Added { unremove: true };
            }
        }

        // Notify everyone who ended up added. The await is deliberate:
        // a notifier failure fails the call even though the membership
        // mutations above have already committed.
        let added: Vec<NotifiedMember> = states
            .iter()
            .filter(|s| matches!(s.step, Step::Added { .. }))
            .map(|s| NotifiedMember {
                email: s.email.clone(),
                is_admin: s.is_admin,
            })
            .collect();
        self.notifier
            .send_bulk_workspace_invite(actor_id, &workspace, &added)
            .await?;

        info!(
            workspace_id = %workspace_id,
            actor_id = %actor_id,
            candidates = states.len(),
            added = added.len(),
            "Bulk member add reconciled"
        );

        Ok(plan::into_outcomes(states))
    }

    /// Classify one candidate without mutating anything.
    ///
    /// The domain gate comes first: an ineligible email is rejected before
    /// any account or membership lookup, regardless of what rows exist.
    async fn preflight(
        &self,
        school: &School,
        workspace_id: Uuid,
        candidate: &MemberCandidate,
    ) -> AppResult<Step> {
        if !school.permits_email(&candidate.email) {
            return Ok(Step::Rejected(MemberErrorCode::DomainPolicyViolation));
        }

        let account = self
            .directory
            .find_account_by_email(school.id, &candidate.email)
            .await?;
        let Some(account) = account else {
            return Ok(Step::Invite);
        };

        let user_ref = account.member_ref();
        match self.members.find(workspace_id, &user_ref).await? {
            None => Ok(Step::DirectAdd { user_ref }),
            Some(member) if member.removed => Ok(Step::Reactivate { user_ref }),
            Some(_) => Ok(Step::Rejected(MemberErrorCode::MemberAlreadyExists)),
        }
    }

    /// List the active members of a workspace.
    pub async fn list_members(
        &self,
        workspace_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WorkspaceMember>> {
        self.require_workspace(workspace_id).await?;
        self.members.list(workspace_id, page).await
    }

    /// Soft-remove a member from a workspace.
    pub async fn remove_member(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<()> {
        self.require_workspace(workspace_id).await?;
        if !self.members.remove(workspace_id, user_ref).await? {
            return Err(AppError::not_found("Member not found"));
        }
        info!(
            workspace_id = %workspace_id,
            user_ref = %user_ref,
            "Member removed"
        );
        Ok(())
    }

    /// Whether the given user reference is an active member of the workspace.
    pub async fn is_active_member(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        self.members.is_active_member(workspace_id, user_ref).await
    }

    /// Whether the given account is an active admin member of the workspace.
    pub async fn is_workspace_admin(&self, workspace_id: Uuid, user_ref: &str) -> AppResult<bool> {
        Ok(self
            .members
            .find(workspace_id, user_ref)
            .await?
            .map(|m| m.is_active() && m.is_admin)
            .unwrap_or(false))
    }

    async fn require_workspace(&self, workspace_id: Uuid) -> AppResult<Workspace> {
        self.directory
            .find_workspace(workspace_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MemoryDirectory, MemoryInvitationStore, MemoryMembershipStore, RecordingNotifier,
    };
    use classhub_core::error::ErrorKind;

    struct Fixture {
        directory: Arc<MemoryDirectory>,
        invitation_store: Arc<MemoryInvitationStore>,
        member_store: Arc<MemoryMembershipStore>,
        notifier: Arc<RecordingNotifier>,
        service: MembershipService,
        school_id: Uuid,
        workspace_id: Uuid,
    }

    fn fixture(domain: Option<&str>) -> Fixture {
        let directory = Arc::new(MemoryDirectory::default());
        let school_id = directory.add_school(domain);
        let workspace_id = directory.add_workspace(school_id, false);
        let invitation_store = Arc::new(MemoryInvitationStore::default());
        let member_store = Arc::new(MemoryMembershipStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let invitations = Arc::new(InvitationService::new(
            directory.clone(),
            invitation_store.clone(),
            7,
        ));
        let service = MembershipService::new(
            directory.clone(),
            member_store.clone(),
            invitations,
            notifier.clone(),
        );
        Fixture {
            directory,
            invitation_store,
            member_store,
            notifier,
            service,
            school_id,
            workspace_id,
        }
    }

    fn candidate(email: &str, admin: bool) -> MemberCandidate {
        MemberCandidate {
            email: email.to_string(),
            admin,
        }
    }

    #[tokio::test]
    async fn test_missing_workspace_is_fatal() {
        let f = fixture(None);
        let err = f
            .service
            .add_members_bulk(Uuid::new_v4(), Uuid::new_v4(), vec![candidate("a@x.edu", false)])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_new_member_goes_through_invite_path() {
        let f = fixture(None);
        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("new@x.edu", false)],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].added);
        assert!(outcomes[0].invited);
        assert!(outcomes[0].error_code.is_none());

        // An invitation row was created...
        let invitations = f.invitation_store.rows();
        assert_eq!(invitations.len(), 1);
        assert_eq!(invitations[0].email, "new@x.edu");
        // ...and a placeholder membership row keyed by the email itself.
        let member = f.member_store.get(f.workspace_id, "new@x.edu").unwrap();
        assert!(!member.removed);
    }

    #[tokio::test]
    async fn test_existing_account_is_added_directly() {
        let f = fixture(None);
        let account_id = f
            .directory
            .add_account(f.school_id, "kid@x.edu", AccountRole::Student);

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("kid@x.edu", true)],
            )
            .await
            .unwrap();

        assert!(outcomes[0].added);
        assert!(!outcomes[0].invited);
        // No invitation was created; the row is keyed by the account id.
        assert!(f.invitation_store.rows().is_empty());
        let member = f
            .member_store
            .get(f.workspace_id, &account_id.to_string())
            .unwrap();
        assert!(member.is_admin);
    }

    #[tokio::test]
    async fn test_duplicate_emails_collapse_to_first_occurrence() {
        let f = fixture(None);
        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("a@x.edu", true), candidate("a@x.edu", false)],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_admin, "first occurrence's admin flag wins");
        let member = f.member_store.get(f.workspace_id, "a@x.edu").unwrap();
        assert!(member.is_admin);
    }

    #[tokio::test]
    async fn test_domain_gate_precedes_every_lookup() {
        let f = fixture(Some("@x.edu"));
        // Even with an account and an active membership for the off-domain
        // email, the outcome is the policy violation.
        let account_id = f
            .directory
            .add_account(f.school_id, "b@y.com", AccountRole::Student);
        f.member_store
            .add_member(f.workspace_id, &account_id.to_string(), false, false);

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("b@y.com", false)],
            )
            .await
            .unwrap();

        assert!(!outcomes[0].added);
        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::DomainPolicyViolation)
        );
        assert!(
            !f.directory.account_lookups().contains(&"b@y.com".to_string()),
            "ineligible email must never reach the directory"
        );
    }

    #[tokio::test]
    async fn test_active_member_is_rejected_without_mutation() {
        let f = fixture(None);
        let account_id = f
            .directory
            .add_account(f.school_id, "kid@x.edu", AccountRole::Student);
        f.member_store
            .add_member(f.workspace_id, &account_id.to_string(), false, false);

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("kid@x.edu", true)],
            )
            .await
            .unwrap();

        assert!(!outcomes[0].added);
        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::MemberAlreadyExists)
        );
        assert_eq!(f.member_store.insert_count(), 0);
        // The stored flag is untouched.
        let member = f
            .member_store
            .get(f.workspace_id, &account_id.to_string())
            .unwrap();
        assert!(!member.is_admin);
    }

    #[tokio::test]
    async fn test_reactivation_overwrites_admin_flag() {
        let f = fixture(None);
        let account_id = f
            .directory
            .add_account(f.school_id, "back@x.edu", AccountRole::Student);
        // Removed member, previously an admin.
        f.member_store
            .add_member(f.workspace_id, &account_id.to_string(), true, true);

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("back@x.edu", false)],
            )
            .await
            .unwrap();

        assert!(outcomes[0].added);
        assert!(outcomes[0].unremove);
        let member = f
            .member_store
            .get(f.workspace_id, &account_id.to_string())
            .unwrap();
        assert!(!member.removed);
        assert!(!member.is_admin, "requested flag overwrites the stored one");
    }

    #[tokio::test]
    async fn test_preexisting_invitation_still_adds_placeholder() {
        let f = fixture(None);
        f.invitation_store.add_live(f.school_id, "waiting@x.edu");

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("waiting@x.edu", false)],
            )
            .await
            .unwrap();

        assert!(outcomes[0].added);
        assert!(outcomes[0].invited);
        assert!(f.member_store.get(f.workspace_id, "waiting@x.edu").is_some());
    }

    #[tokio::test]
    async fn test_invitation_insert_race_is_benign() {
        let f = fixture(None);
        f.invitation_store.conflict_on_insert("raced@x.edu");

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("raced@x.edu", false)],
            )
            .await
            .unwrap();

        assert!(outcomes[0].added);
        assert!(outcomes[0].invited);
    }

    #[tokio::test]
    async fn test_ledger_account_conflict_is_terminal() {
        let f = fixture(None);
        // The account appears between preflight and the invitation pass:
        // preflight saw nothing, the ledger sees an account.
        f.directory
            .add_account_after_first_lookup(f.school_id, "late@x.edu", AccountRole::Student);

        let outcomes = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("late@x.edu", false)],
            )
            .await
            .unwrap();

        assert!(!outcomes[0].added);
        assert_eq!(
            outcomes[0].error_code,
            Some(MemberErrorCode::AccountAlreadyExists)
        );
        assert!(f.member_store.get(f.workspace_id, "late@x.edu").is_none());
    }

    #[tokio::test]
    async fn test_classification_is_deterministic() {
        let candidates = || {
            vec![
                candidate("new@x.edu", false),
                candidate("kid@x.edu", true),
                candidate("off@y.com", false),
            ]
        };
        let mut all_outcomes = Vec::new();
        for _ in 0..2 {
            let f = fixture(Some("@x.edu"));
            f.directory
                .add_account(f.school_id, "kid@x.edu", AccountRole::Student);
            let outcomes = f
                .service
                .add_members_bulk(Uuid::new_v4(), f.workspace_id, candidates())
                .await
                .unwrap();
            all_outcomes.push(
                outcomes
                    .into_iter()
                    .map(|o| (o.email, o.added, o.invited, o.error_code))
                    .collect::<Vec<_>>(),
            );
        }
        assert_eq!(all_outcomes[0], all_outcomes[1]);
    }

    #[tokio::test]
    async fn test_notifier_receives_only_added_members() {
        let f = fixture(None);
        let account_id = f
            .directory
            .add_account(f.school_id, "member@x.edu", AccountRole::Student);
        f.member_store
            .add_member(f.workspace_id, &account_id.to_string(), false, false);

        let actor = Uuid::new_v4();
        f.service
            .add_members_bulk(
                actor,
                f.workspace_id,
                vec![candidate("member@x.edu", false), candidate("new@x.edu", true)],
            )
            .await
            .unwrap();

        let calls = f.notifier.calls();
        assert_eq!(calls.len(), 1);
        let (actor_id, _, notified) = &calls[0];
        assert_eq!(*actor_id, actor);
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].email, "new@x.edu");
        assert!(notified[0].is_admin);
    }

    #[tokio::test]
    async fn test_notifier_failure_fails_the_call_after_commit() {
        let f = fixture(None);
        f.notifier.fail_next();

        let err = f
            .service
            .add_members_bulk(
                Uuid::new_v4(),
                f.workspace_id,
                vec![candidate("new@x.edu", false)],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ExternalService);
        // The membership mutation had already committed.
        assert!(f.member_store.get(f.workspace_id, "new@x.edu").is_some());
    }

    #[tokio::test]
    async fn test_remove_member_soft_removes() {
        let f = fixture(None);
        f.member_store
            .add_member(f.workspace_id, "someone@x.edu", false, false);

        f.service
            .remove_member(f.workspace_id, "someone@x.edu")
            .await
            .unwrap();

        let member = f.member_store.get(f.workspace_id, "someone@x.edu").unwrap();
        assert!(member.removed);

        let err = f
            .service
            .remove_member(f.workspace_id, "missing@x.edu")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_is_workspace_admin() {
        let f = fixture(None);
        f.member_store.add_member(f.workspace_id, "adm", true, false);
        f.member_store.add_member(f.workspace_id, "gone", true, true);
        f.member_store.add_member(f.workspace_id, "plain", false, false);

        assert!(f.service.is_workspace_admin(f.workspace_id, "adm").await.unwrap());
        assert!(!f.service.is_workspace_admin(f.workspace_id, "gone").await.unwrap());
        assert!(!f.service.is_workspace_admin(f.workspace_id, "plain").await.unwrap());
        assert!(!f.service.is_workspace_admin(f.workspace_id, "absent").await.unwrap());
    }
}
