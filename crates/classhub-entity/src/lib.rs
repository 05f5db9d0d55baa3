//! # classhub-entity
//!
//! Domain entities for ClassHub: schools, accounts, invitations, workspaces,
//! and workspace membership. Each entity maps to one table and carries the
//! small domain helpers that belong with the data.

pub mod account;
pub mod invitation;
pub mod school;
pub mod workspace;
