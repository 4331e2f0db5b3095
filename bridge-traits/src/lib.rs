//! # Host Bridge Traits
//!
//! Capability contracts shared between the mirror core and its collaborators.
//!
//! ## Overview
//!
//! The core never talks to a cloud API or an HTTP stack directly. Each is
//! reached through a trait defined here so the engine can be driven by
//! real connectors in production and by in-memory fakes in tests.
//!
//! ## Traits
//!
//! ### Remote storage
//! - [`StorageProvider`](storage::StorageProvider) - Collections and files of one cloud account
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LogLevel`](time::LogLevel) - Verbosity shared by the logging setup
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Connector
//! implementations should:
//!
//! - Convert backend-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (item ids, HTTP status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so handles can be shared
//! across the engine's concurrent transfer tasks.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{
    Collection, CollectionMetadata, FileItem, FileUploadMetadata, ResourceType, StorageProvider,
    UploadOptions,
};
pub use time::{Clock, LogLevel, SystemClock};
