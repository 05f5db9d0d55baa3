//! Workspace membership notifier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_entity::workspace::Workspace;

use super::email::EmailSender;

/// One member included in a bulk-add notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifiedMember {
    /// Recipient email.
    pub email: String,
    /// Whether the member was added as a workspace admin.
    pub is_admin: bool,
}

/// Sends notifications for newly added or invited workspace members.
///
/// Callers await the notifier directly; a failure here fails the whole
/// operation even though membership mutations have already committed.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify every member of the final added set for one bulk-add call.
    async fn send_bulk_workspace_invite(
        &self,
        actor_id: Uuid,
        workspace: &Workspace,
        members: &[NotifiedMember],
    ) -> AppResult<()>;
}

/// Email-backed [`Notifier`].
#[derive(Clone)]
pub struct EmailNotifier {
    sender: Arc<dyn EmailSender>,
}

impl EmailNotifier {
    /// Creates a new email notifier.
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    fn compose_body(workspace: &Workspace, member: &NotifiedMember) -> String {
        let role_line = if member.is_admin {
            "You have been added as a workspace admin."
        } else {
            "You have been added as a member."
        };
        format!(
            "Hi,\n\n\
             You have been added to the workspace \"{}\".\n\
             {}\n\n\
             If you don't have an account yet, an invitation is waiting for \
             this address — sign up with it to join.\n\n\
             - The ClassHub Team",
            workspace.name, role_line
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_bulk_workspace_invite(
        &self,
        actor_id: Uuid,
        workspace: &Workspace,
        members: &[NotifiedMember],
    ) -> AppResult<()> {
        let subject = format!("You've been added to {}", workspace.name);

        for member in members {
            let body = Self::compose_body(workspace, member);
            self.sender
                .send(&member.email, &subject, &body)
                .await
                .map_err(|e| {
                    AppError::external_service(format!(
                        "Failed to notify '{}': {e}",
                        member.email
                    ))
                })?;
        }

        info!(
            workspace_id = %workspace.id,
            actor_id = %actor_id,
            notified = members.len(),
            "Bulk membership notification sent"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_compose_body_mentions_workspace_and_role() {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
            name: "Robotics Club".to_string(),
            archived: false,
            created_at: Utc::now(),
        };
        let body = EmailNotifier::compose_body(
            &workspace,
            &NotifiedMember {
                email: "kid@north.edu".to_string(),
                is_admin: true,
            },
        );
        assert!(body.contains("Robotics Club"));
        assert!(body.contains("workspace admin"));
    }
}
