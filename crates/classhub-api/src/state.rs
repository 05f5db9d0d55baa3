//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use classhub_core::config::AppConfig;
use classhub_database::repositories::WorkspaceRepository;
use classhub_service::account::AccountService;
use classhub_service::invitation::InvitationService;
use classhub_service::membership::MembershipService;

use crate::auth::JwtDecoder;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Workspace repository (permission checks)
    pub workspace_repo: Arc<WorkspaceRepository>,
    /// Membership reconciliation service
    pub membership_service: Arc<MembershipService>,
    /// Invitation ledger service
    pub invitation_service: Arc<InvitationService>,
    /// Account registration service
    pub account_service: Arc<AccountService>,
}
