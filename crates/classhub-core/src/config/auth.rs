//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer-token authentication settings.
///
/// Token *issuance* is the identity service's concern; this backend only
/// validates tokens, so the secret is the sole required setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the token issuer.
    pub jwt_secret: String,
}
