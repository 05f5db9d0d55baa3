//! Repository implementations and the store capability traits consumed by
//! the service layer.

pub mod account;
pub mod directory;
pub mod invitation;
pub mod school;
pub mod workspace;
pub mod workspace_member;

pub use account::{AccountRepository, AccountStore};
pub use directory::{DbDirectory, Directory};
pub use invitation::{InvitationRepository, InvitationStore};
pub use school::SchoolRepository;
pub use workspace::WorkspaceRepository;
pub use workspace_member::{MembershipStore, WorkspaceMemberRepository};
