//! Account domain entities.

pub mod model;
pub mod role;

pub use model::{Account, CreateAccount};
pub use role::AccountRole;
