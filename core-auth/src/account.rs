//! Account files
//!
//! An account file is a small JSON document identifying one storage account:
//!
//! ```json
//! {
//!   "client_id": "1234.apps.googleusercontent.com",
//!   "client_secret": "...",
//!   "refresh_token": "1//0g...",
//!   "scope": ["https://www.googleapis.com/auth/drive"]
//! }
//! ```
//!
//! `scope` and `token_url` are optional.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Full read/write access to Drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Credentials for one storage account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub refresh_token: String,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub token_url: Option<String>,
}

impl AccountConfig {
    /// Load and validate an account file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AuthError::AccountFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let account: Self = serde_json::from_str(&raw).map_err(|e| AuthError::AccountFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        account.validate()?;
        tracing::debug!(path = %path.display(), "Loaded account file");
        Ok(account)
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::InvalidAccount("client_id is empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidAccount(
                "refresh_token is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// OAuth client settings for this account.
    pub fn oauth_config(&self) -> OAuthConfig {
        let scopes = if self.scope.is_empty() {
            vec![DRIVE_SCOPE.to_string()]
        } else {
            self.scope.clone()
        };

        OAuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes,
            token_url: self
                .token_url
                .clone()
                .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
        }
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("token_url", &self.token_url)
            .finish()
    }
}
