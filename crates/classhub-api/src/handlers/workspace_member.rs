//! Workspace membership handlers — bulk add, roster import, list, remove.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_entity::workspace::Workspace;
use classhub_service::context::RequestContext;
use classhub_service::outcome::MemberCandidate;
use classhub_service::roster::parse_roster;
use classhub_service::validation::validate_candidates;

use crate::dto::request::BulkAddMembersRequest;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/workspaces/{id}/members/bulk
pub async fn bulk_add_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    Json(req): Json<BulkAddMembersRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let candidates: Vec<MemberCandidate> = req
        .members
        .into_iter()
        .map(|m| MemberCandidate {
            email: m.email.trim().to_string(),
            admin: m.admin,
        })
        .collect();

    validate_candidates(&candidates, state.config.workspace.max_bulk_members)?;
    let workspace = require_workspace_admin(&state, &auth, workspace_id).await?;

    let outcomes = state
        .membership_service
        .add_members_bulk(auth.account_id, workspace.id, candidates)
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": outcomes }),
    ))
}

/// POST /api/workspaces/{id}/members/import — multipart roster upload
pub async fn import_roster(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_file(format!("Malformed multipart body: {e}")))?
    {
        // The upload field has historically been spelled "roaster"; accept
        // the correct spelling too.
        if matches!(field.name(), Some("roaster") | Some("roster")) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_file(format!("Failed to read roster file: {e}")))?;
            data = Some(bytes);
        }
    }

    let data = data.ok_or_else(|| AppError::invalid_file("Missing 'roaster' file field"))?;
    if data.len() > state.config.workspace.max_roster_bytes {
        return Err(AppError::invalid_file("Roster file is too large"));
    }

    let candidates = parse_roster(&data)?;
    validate_candidates(&candidates, state.config.workspace.max_bulk_members)?;
    let workspace = require_workspace_admin(&state, &auth, workspace_id).await?;

    let outcomes = state
        .membership_service
        .add_members_bulk(auth.account_id, workspace.id, candidates)
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": outcomes }),
    ))
}

/// GET /api/workspaces/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_workspace_member(&state, &auth, workspace_id).await?;

    let members = state
        .membership_service
        .list_members(workspace_id, &params.into_page_request())
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": members }),
    ))
}

/// DELETE /api/workspaces/{id}/members/{user_ref}
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((workspace_id, user_ref)): Path<(Uuid, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_workspace_admin(&state, &auth, workspace_id).await?;

    state
        .membership_service
        .remove_member(workspace_id, &user_ref)
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Member removed" } }),
    ))
}

/// Fetch the workspace and require the caller to be one of its active
/// admin members.
async fn require_workspace_admin(
    state: &AppState,
    ctx: &RequestContext,
    workspace_id: Uuid,
) -> Result<Workspace, AppError> {
    let workspace = require_workspace(state, ctx, workspace_id).await?;
    if workspace.archived {
        return Err(AppError::forbidden("Workspace is archived"));
    }
    if !state
        .membership_service
        .is_workspace_admin(workspace_id, &ctx.member_ref())
        .await?
    {
        return Err(AppError::unauthorized(
            "Caller is not an admin member of this workspace",
        ));
    }
    Ok(workspace)
}

/// Fetch the workspace and require the caller to be an active member.
async fn require_workspace_member(
    state: &AppState,
    ctx: &RequestContext,
    workspace_id: Uuid,
) -> Result<Workspace, AppError> {
    let workspace = require_workspace(state, ctx, workspace_id).await?;
    let is_admin = state
        .membership_service
        .is_workspace_admin(workspace_id, &ctx.member_ref())
        .await?;
    if !is_admin
        && !state
            .membership_service
            .is_active_member(workspace_id, &ctx.member_ref())
            .await?
    {
        return Err(AppError::unauthorized(
            "Caller is not a member of this workspace",
        ));
    }
    Ok(workspace)
}

async fn require_workspace(
    state: &AppState,
    ctx: &RequestContext,
    workspace_id: Uuid,
) -> Result<Workspace, AppError> {
    let workspace = state
        .workspace_repo
        .find_by_id(workspace_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workspace not found"))?;
    // Workspaces outside the caller's school are indistinguishable from
    // missing ones.
    if workspace.school_id != ctx.school_id {
        return Err(AppError::not_found("Workspace not found"));
    }
    Ok(workspace)
}
