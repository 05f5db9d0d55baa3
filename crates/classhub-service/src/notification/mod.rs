//! Outbound notification dispatch for membership changes.

pub mod email;
pub mod notifier;

pub use email::{EmailSender, LogEmailSender};
pub use notifier::{EmailNotifier, NotifiedMember, Notifier};
