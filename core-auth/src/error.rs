use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read account file {path}: {reason}")]
    AccountFile { path: String, reason: String },

    #[error("Invalid account configuration: {0}")]
    InvalidAccount(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Auth error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
