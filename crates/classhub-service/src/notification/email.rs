//! Email delivery capability.
//!
//! Actual delivery transport (SMTP, provider API) lives outside this
//! backend; the default implementation records the dispatch in the log
//! stream so local and test environments need no mail infrastructure.

use async_trait::async_trait;
use tracing::info;

use classhub_core::result::AppResult;

/// Sends a single email message.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message to one recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Log-only sender used where no delivery transport is configured.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> AppResult<()> {
        info!(to = %to, subject = %subject, "Email dispatched");
        Ok(())
    }
}
