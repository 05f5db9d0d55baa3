//! Route definitions for the ClassHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Headroom on top of the roster size limit for multipart framing.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.workspace.max_roster_bytes + UPLOAD_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .merge(account_routes())
        .merge(invitation_routes())
        .merge(workspace_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Account registration endpoints
fn account_routes() -> Router<AppState> {
    Router::new().route("/accounts/register", post(handlers::account::register))
}

/// Invitation management endpoints
fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route("/invitations", post(handlers::invitation::create_invitation))
        .route("/invitations", get(handlers::invitation::list_invitations))
        .route(
            "/invitations/{id}",
            delete(handlers::invitation::revoke_invitation),
        )
}

/// Workspace membership endpoints
fn workspace_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces/{id}/members",
            get(handlers::workspace_member::list_members),
        )
        .route(
            "/workspaces/{id}/members/bulk",
            post(handlers::workspace_member::bulk_add_members),
        )
        .route(
            "/workspaces/{id}/members/import",
            post(handlers::workspace_member::import_roster),
        )
        .route(
            "/workspaces/{id}/members/{user_ref}",
            delete(handlers::workspace_member::remove_member),
        )
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
