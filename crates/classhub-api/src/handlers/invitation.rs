//! Invitation handlers — create, list, revoke.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_entity::account::AccountRole;
use classhub_service::validation::validate_email;

use crate::dto::request::CreateInvitationRequest;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_member_manager(&auth)?;

    let email = req.email.trim().to_string();
    validate_email(&email)?;

    let invitation = state
        .invitation_service
        .create(
            &auth.member_ref(),
            &email,
            req.role.unwrap_or(AccountRole::Student),
            auth.school_id,
        )
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": invitation }),
    ))
}

/// GET /api/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_member_manager(&auth)?;

    let invitations = state
        .invitation_service
        .list(auth.school_id, &params.into_page_request())
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": invitations }),
    ))
}

/// DELETE /api/invitations/{id}
pub async fn revoke_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_member_manager(&auth)?;

    state.invitation_service.revoke(auth.school_id, id).await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Invitation revoked" } }),
    ))
}

fn require_member_manager(auth: &AuthUser) -> Result<(), AppError> {
    if !auth.can_manage_members() {
        return Err(AppError::unauthorized(
            "Caller may not manage invitations",
        ));
    }
    Ok(())
}
