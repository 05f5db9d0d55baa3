//! Account registration handler.

use axum::Json;
use axum::extract::State;

use classhub_core::error::AppError;
use classhub_service::account::RegisterAccount;

use crate::dto::request::RegisterAccountRequest;
use crate::state::AppState;

/// POST /api/accounts/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterAccountRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let account = state
        .account_service
        .register(RegisterAccount {
            school_id: req.school_id,
            email: req.email.trim().to_string(),
            role: req.role,
        })
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": account }),
    ))
}
