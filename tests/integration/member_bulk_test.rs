//! Bulk member-add endpoint: auth and validation boundary.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use classhub_entity::account::AccountRole;

use crate::helpers::{body_json, mint_token, send_json, test_router};

fn bulk_path() -> String {
    format!("/api/workspaces/{}/members/bulk", Uuid::new_v4())
}

fn members(len: usize) -> serde_json::Value {
    let entries: Vec<_> = (0..len)
        .map(|i| json!({ "email": format!("user{i}@north.edu"), "admin": false }))
        .collect();
    json!({ "members": entries })
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = test_router();
    let response = send_json(&router, "GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_bulk_add_requires_auth() {
    let router = test_router();
    let response = send_json(&router, "POST", &bulk_path(), None, Some(members(1))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bulk_add_rejects_garbage_token() {
    let router = test_router();
    let response = send_json(
        &router,
        "POST",
        &bulk_path(),
        Some("not-a-jwt"),
        Some(members(1)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bulk_add_rejects_empty_batch() {
    let router = test_router();
    let token = mint_token(AccountRole::Teacher);
    let response = send_json(
        &router,
        "POST",
        &bulk_path(),
        Some(&token),
        Some(members(0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bulk_add_rejects_oversized_batch() {
    let router = test_router();
    let token = mint_token(AccountRole::Teacher);
    let response = send_json(
        &router,
        "POST",
        &bulk_path(),
        Some(&token),
        Some(members(601)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bulk_add_boundary_batch_passes_validation() {
    let router = test_router();
    let token = mint_token(AccountRole::Teacher);
    // 600 entries clear the validation boundary; without a live database
    // the request then fails further in, but never as a validation error.
    let response = send_json(
        &router,
        "POST",
        &bulk_path(),
        Some(&token),
        Some(members(600)),
    )
    .await;
    assert_ne!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_add_rejects_malformed_email() {
    let router = test_router();
    let token = mint_token(AccountRole::Teacher);
    let body = json!({ "members": [{ "email": "not-an-email", "admin": true }] });
    let response = send_json(&router, "POST", &bulk_path(), Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_invitation_requires_manager_role() {
    let router = test_router();
    let token = mint_token(AccountRole::Student);
    let body = json!({ "email": "kid@north.edu" });
    let response = send_json(&router, "POST", "/api/invitations", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_malformed_email() {
    let router = test_router();
    let body = json!({ "school_id": Uuid::new_v4(), "email": "broken" });
    let response = send_json(&router, "POST", "/api/accounts/register", None, Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
