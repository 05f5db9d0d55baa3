//! # classhub-api
//!
//! HTTP API layer for ClassHub. Defines the Axum router, request/response
//! DTOs, extractors, middleware, and the handlers that front the
//! membership and invitation services.

pub mod auth;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
