//! Invitation domain entities.

pub mod model;

pub use model::{expiry_at, Invitation, NewInvitation};
