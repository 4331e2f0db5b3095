//! # Authentication Module
//!
//! Per-account OAuth 2.0 sessions for the storage connectors.
//!
//! ## Overview
//!
//! Each side of a mirror run (source and destination) is described by an
//! account file holding an OAuth client and a long-lived refresh token. This
//! crate loads those files, exchanges the refresh token for access tokens, and
//! hands connectors a [`TokenSource`] that always yields a usable bearer token.
//!
//! ## Features
//!
//! - JSON account files compatible with the common Drive client layout
//! - Refresh-token grant with retry on server errors
//! - Cached access tokens refreshed shortly before expiry

pub mod account;
pub mod error;
pub mod oauth;
pub mod token_source;
pub mod types;

pub use account::AccountConfig;
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager};
pub use token_source::{RefreshingTokenSource, StaticTokenSource, TokenSource};
pub use types::OAuthTokens;
