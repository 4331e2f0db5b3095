//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// No access token could be obtained for the account
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned a non-success status
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Drive throttled the request; reported as 403 with a rate-limit reason
    #[error("Google Drive rate limit ({reason}): {message}")]
    RateLimited { reason: String, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

/// 403 reasons Drive uses for throttling rather than permission failures.
pub const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

impl GoogleDriveError {
    /// Whether the status is one the Drive API asks clients to retry.
    pub fn is_retryable_status(status_code: u16) -> bool {
        status_code == 429 || (500..600).contains(&status_code)
    }

    /// Whether a later attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GoogleDriveError::RateLimited { .. } => true,
            GoogleDriveError::ApiError { status_code, .. } => Self::is_retryable_status(*status_code),
            GoogleDriveError::BridgeError(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::AuthenticationFailed(msg) => {
                BridgeError::Rejected(format!("Authentication failed: {}", msg))
            }
            GoogleDriveError::ApiError {
                status_code,
                message,
            } => {
                let message = format!("API error (status {}): {}", status_code, message);
                if status_code == 404 {
                    BridgeError::NotFound(message)
                } else if GoogleDriveError::is_retryable_status(status_code) {
                    BridgeError::OperationFailed(message)
                } else {
                    BridgeError::Rejected(message)
                }
            }
            GoogleDriveError::RateLimited { reason, message } => {
                BridgeError::OperationFailed(format!("Rate limited ({}): {}", reason, message))
            }
            GoogleDriveError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GoogleDriveError::BridgeError(e) => e,
        }
    }
}
