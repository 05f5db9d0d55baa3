//! Transient per-address result types for bulk membership operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate member in a bulk-add request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCandidate {
    /// Email address as provided by the caller.
    pub email: String,
    /// Whether the candidate should administer the workspace.
    #[serde(default)]
    pub admin: bool,
}

/// Terminal failure codes reported per candidate.
///
/// These never abort a batch; they describe why one address was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberErrorCode {
    /// The email does not match the school's enforced domain.
    DomainPolicyViolation,
    /// An account already exists for the email.
    AccountAlreadyExists,
    /// A live invitation already exists for the email.
    InvitationAlreadyExists,
    /// The account is already an active member of the workspace.
    MemberAlreadyExists,
}

/// Final state of one distinct input address after reconciliation.
///
/// Exactly one of `added` or `error_code` describes the terminal state;
/// `invited` and `unremove` qualify *how* an added member got there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberOutcome {
    /// The candidate email.
    pub email: String,
    /// The admin flag that was applied (first occurrence wins).
    pub is_admin: bool,
    /// The candidate is now an active member (or placeholder member).
    #[serde(default, skip_serializing_if = "is_false")]
    pub added: bool,
    /// An invitation backs this membership (placeholder row keyed by email).
    #[serde(default, skip_serializing_if = "is_false")]
    pub invited: bool,
    /// The membership was restored from a removed row.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unremove: bool,
    /// Terminal failure code, if the candidate was not added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<MemberErrorCode>,
}

/// Per-email result of a batch invitation create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteOutcome {
    /// The invited email.
    pub email: String,
    /// Whether a new invitation row was persisted.
    pub inserted: bool,
    /// Id of the created invitation, when inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Why the invitation was not created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<MemberErrorCode>,
}

impl InviteOutcome {
    /// An outcome recording a successfully persisted invitation.
    pub fn inserted(email: impl Into<String>, id: Uuid) -> Self {
        Self {
            email: email.into(),
            inserted: true,
            id: Some(id),
            error_code: None,
        }
    }

    /// An outcome recording a skipped email.
    pub fn rejected(email: impl Into<String>, code: MemberErrorCode) -> Self {
        Self {
            email: email.into(),
            inserted: false,
            id: None,
            error_code: Some(code),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&MemberErrorCode::DomainPolicyViolation).unwrap();
        assert_eq!(json, "\"DOMAIN_POLICY_VIOLATION\"");
        let json = serde_json::to_string(&MemberErrorCode::MemberAlreadyExists).unwrap();
        assert_eq!(json, "\"MEMBER_ALREADY_EXISTS\"");
    }

    #[test]
    fn test_outcome_omits_false_flags() {
        let outcome = MemberOutcome {
            email: "kid@north.edu".to_string(),
            is_admin: false,
            added: true,
            invited: false,
            unremove: false,
            error_code: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["added"], true);
        assert!(json.get("invited").is_none());
        assert!(json.get("error_code").is_none());
    }
}
