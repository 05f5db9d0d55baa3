//! Workspace (class/club) domain entities.

pub mod member;
pub mod model;

pub use member::{NewWorkspaceMember, WorkspaceMember};
pub use model::Workspace;
