//! Account registration service.
//!
//! Registration is where an email placeholder turns into a real account:
//! any pending invitation for the address is consumed, and membership rows
//! keyed by the email are re-keyed to the new account id so workspaces the
//! invitee was bulk-added to become reachable immediately.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_database::repositories::{AccountStore, Directory, MembershipStore};
use classhub_entity::account::{Account, AccountRole, CreateAccount};

use crate::invitation::InvitationService;
use crate::validation::validate_email;

/// Data for a registration request.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    /// The school to register under.
    pub school_id: Uuid,
    /// Email address.
    pub email: String,
    /// Requested role; defaults to the invitation's role, else student.
    pub role: Option<AccountRole>,
}

/// Handles account registration.
#[derive(Clone)]
pub struct AccountService {
    directory: Arc<dyn Directory>,
    accounts: Arc<dyn AccountStore>,
    invitations: Arc<InvitationService>,
    members: Arc<dyn MembershipStore>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        directory: Arc<dyn Directory>,
        accounts: Arc<dyn AccountStore>,
        invitations: Arc<InvitationService>,
        members: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            directory,
            accounts,
            invitations,
            members,
        }
    }

    /// Register a new account.
    ///
    /// Consumes any pending invitation for (email, school) and re-keys
    /// email-placeholder membership rows to the new account id.
    pub async fn register(&self, req: RegisterAccount) -> AppResult<Account> {
        validate_email(&req.email)?;

        let school = self
            .directory
            .find_school(req.school_id)
            .await?
            .ok_or_else(|| AppError::not_found("School not found"))?;

        if school.deactivated {
            return Err(AppError::forbidden("School is deactivated"));
        }
        if !school.permits_email(&req.email) {
            return Err(AppError::validation(format!(
                "'{}' is not permitted by the school's domain restriction",
                req.email
            )));
        }

        let invitation = self
            .invitations
            .live_invitation(req.school_id, &req.email)
            .await?;

        let role = req
            .role
            .or_else(|| invitation.as_ref().map(|i| i.role))
            .unwrap_or(AccountRole::Student);

        let account = self
            .accounts
            .create(&CreateAccount {
                school_id: req.school_id,
                email: req.email.clone(),
                role,
            })
            .await?;

        let consumed = self.invitations.consume(req.school_id, &req.email).await?;
        let rekeyed = self.members.rekey(&req.email, account.id).await?;

        info!(
            school_id = %req.school_id,
            account_id = %account.id,
            email = %req.email,
            consumed,
            rekeyed,
            "Account registered"
        );

        Ok(account)
    }
}
