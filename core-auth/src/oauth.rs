//! OAuth 2.0 refresh-token exchange
//!
//! Implements the `refresh_token` grant of RFC 6749 §6 against a provider's
//! token endpoint. Account files already carry a long-lived refresh token, so
//! no interactive authorization flow is needed.
//!
//! # Security
//!
//! Never logs sensitive values (tokens, secrets).
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthFlowManager, OAuthConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: Some("your-client-secret".to_string()),
//!     scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
//!     token_url: "https://oauth2.googleapis.com/token".to_string(),
//! };
//!
//! let flow_manager = OAuthFlowManager::new(config, http_client);
//! let tokens = flow_manager.refresh_access_token("1//0g...").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{instrument, warn};

/// Maximum token endpoint attempts on server errors.
const MAX_REFRESH_ATTEMPTS: u32 = 3;

/// OAuth 2.0 client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (optional for public clients)
    pub client_secret: Option<String>,
    /// Scopes requested with the refresh
    pub scopes: Vec<String>,
    /// Token endpoint URL
    pub token_url: String,
}

/// OAuth 2.0 token exchange manager.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl OAuthFlowManager {
    /// Create a new manager using the system clock.
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_clock(config, http_client, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http_client,
            clock,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Refresh an access token using a refresh token.
    ///
    /// Server errors (5xx) are retried up to three attempts with exponential
    /// backoff; client errors (4xx) fail immediately since the refresh token
    /// is invalid or revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenRefreshFailed` if the endpoint rejects the
    /// request or every attempt fails.
    #[instrument(skip(self, refresh_token), fields(client_id = %self.config.client_id))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let scope = self.config.scopes.join(" ");

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.config.client_id);

        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret", client_secret);
        }
        if !scope.is_empty() {
            params.insert("scope", &scope);
        }

        tracing::debug!("Refreshing access token");

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;
        let body = Bytes::from(encoded_body);

        let mut attempts = 0;

        loop {
            attempts += 1;

            let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body.clone());

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| AuthError::NetworkError(e.to_string()))?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                tracing::info!(
                    "Successfully refreshed token (expires in {}s)",
                    token_response.expires_in
                );

                return Ok(OAuthTokens::issued_at(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .unwrap_or_else(|| refresh_token.to_string()),
                    self.clock.now(),
                    token_response.expires_in,
                ));
            }

            let status = response.status;

            if response.is_client_error() {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                warn!(
                    status = status,
                    error = %error_body,
                    "Token refresh failed without retry"
                );

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            if attempts >= MAX_REFRESH_ATTEMPTS {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = Duration::from_millis(100 * 2u64.pow(attempts - 1));
            warn!(
                status = status,
                attempts = attempts,
                delay_ms = delay.as_millis(),
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}
