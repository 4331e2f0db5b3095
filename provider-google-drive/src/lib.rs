//! # Google Drive Provider
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This crate provides:
//! - Paginated listing of root folders and their direct members
//! - Exact-title lookups built on Drive `name = '...'` queries
//! - Folder creation and multipart file uploads that preserve metadata
//! - Retry with exponential backoff for reads (never for creates)
//!
//! Access tokens come from a `core_auth::TokenSource`, so one connector
//! instance is bound to exactly one account.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
