//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use classhub_entity::account::AccountRole;

/// One candidate entry in a bulk member-add request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    /// Candidate email.
    pub email: String,
    /// Whether to add the candidate as a workspace admin.
    #[serde(default)]
    pub admin: bool,
}

/// Bulk member-add request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkAddMembersRequest {
    /// Candidate members.
    #[validate(length(min = 1, message = "At least one member is required"))]
    pub members: Vec<MemberEntry>,
}

/// Create invitation request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationRequest {
    /// Invitee email.
    pub email: String,
    /// Role the invitee will receive; defaults to student.
    pub role: Option<AccountRole>,
}

/// Account registration request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    /// School to register under.
    pub school_id: Uuid,
    /// Email address.
    pub email: String,
    /// Requested role; defaults to the pending invitation's role.
    pub role: Option<AccountRole>,
}
