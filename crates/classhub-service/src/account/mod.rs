//! Account registration and invitation consumption.

pub mod service;

pub use service::{AccountService, RegisterAccount};
