//! # Core Configuration Module
//!
//! Provides configuration management for a mirror run.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every dependency and setting the bootstrap needs.
//! It enforces fail-fast validation so a run never starts against a
//! half-specified environment.
//!
//! ## Settings
//!
//! - Source and destination account files (default `config-src.json` /
//!   `config-dest.json`)
//! - Concurrency limits for collections and files
//! - Failure isolation and create retry attempts
//! - Logging configuration
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .source_account("accounts/src.json")
//!     .destination_account("accounts/dest.json")
//!     .max_concurrent_files(8)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Both accounts resolve to the same file
//! let config = CoreConfig::builder()
//!     .source_account("same.json")
//!     .destination_account("same.json")
//!     .build()
//!     .expect("Should fail - source and destination are identical");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::HttpClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default account file for the source side.
pub const DEFAULT_SOURCE_ACCOUNT: &str = "config-src.json";

/// Default account file for the destination side.
pub const DEFAULT_DESTINATION_ACCOUNT: &str = "config-dest.json";

/// Upper bound accepted for either concurrency limit.
pub const MAX_CONCURRENCY: usize = 64;

/// Core configuration for a mirror run.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Account file for the source storage account
    pub source_account: PathBuf,

    /// Account file for the destination storage account
    pub destination_account: PathBuf,

    /// HTTP client for API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Collections processed at the same time
    pub max_concurrent_collections: usize,

    /// Files processed at the same time within one collection
    pub max_concurrent_files: usize,

    /// Keep going after a failed item instead of aborting the run
    pub isolate_failures: bool,

    /// Attempts per create operation, including the first
    pub create_retry_attempts: u32,

    /// Logging setup for the host binary
    pub logging: LoggingConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("source_account", &self.source_account)
            .field("destination_account", &self.destination_account)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "max_concurrent_collections",
                &self.max_concurrent_collections,
            )
            .field("max_concurrent_files", &self.max_concurrent_files)
            .field("isolate_failures", &self.isolate_failures)
            .field("create_retry_attempts", &self.create_retry_attempts)
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Account paths are not empty and differ from each other
    /// - Concurrency limits are within `1..=MAX_CONCURRENCY`
    /// - At least one create attempt is allowed
    pub fn validate(&self) -> Result<()> {
        if self.source_account.as_os_str().is_empty() {
            return Err(Error::Config(
                "Source account path cannot be empty".to_string(),
            ));
        }

        if self.destination_account.as_os_str().is_empty() {
            return Err(Error::Config(
                "Destination account path cannot be empty".to_string(),
            ));
        }

        if same_path(&self.source_account, &self.destination_account) {
            return Err(Error::Config(format!(
                "Source and destination use the same account file ({}). \
                 Mirroring an account onto itself is not supported.",
                self.source_account.display()
            )));
        }

        validate_limit("max_concurrent_collections", self.max_concurrent_collections)?;
        validate_limit("max_concurrent_files", self.max_concurrent_files)?;

        if self.create_retry_attempts == 0 {
            return Err(Error::Config(
                "Create retry attempts must be at least 1 (1 = no retry)".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the injected HTTP client or an actionable error.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "An HttpClient implementation is required to reach the storage API. \
                          Desktop: inject bridge_desktop::ReqwestHttpClient."
                    .to_string(),
            })
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn validate_limit(name: &str, value: usize) -> Result<()> {
    if value == 0 || value > MAX_CONCURRENCY {
        return Err(Error::Config(format!(
            "{} must be between 1 and {} (got {})",
            name, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Unset values fall back to the defaults documented on each setter.
#[derive(Default)]
pub struct CoreConfigBuilder {
    source_account: Option<PathBuf>,
    destination_account: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    max_concurrent_collections: Option<usize>,
    max_concurrent_files: Option<usize>,
    isolate_failures: bool,
    create_retry_attempts: Option<u32>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the source account file. Default: `config-src.json`.
    pub fn source_account<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source_account = Some(path.into());
        self
    }

    /// Sets the destination account file. Default: `config-dest.json`.
    pub fn destination_account<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.destination_account = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use core_runtime::config::CoreConfig;
    /// use std::sync::Arc;
    /// # use bridge_traits::HttpClient;
    /// # struct MyHttpClient;
    /// # #[async_trait::async_trait]
    /// # impl HttpClient for MyHttpClient {
    /// #     async fn execute(&self, request: bridge_traits::HttpRequest) -> Result<bridge_traits::HttpResponse, bridge_traits::BridgeError> { unimplemented!() }
    /// # }
    ///
    /// let builder = CoreConfig::builder()
    ///     .http_client(Arc::new(MyHttpClient));
    /// ```
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Collections processed concurrently. Default: 1.
    pub fn max_concurrent_collections(mut self, limit: usize) -> Self {
        self.max_concurrent_collections = Some(limit);
        self
    }

    /// Files processed concurrently within a collection. Default: 4.
    pub fn max_concurrent_files(mut self, limit: usize) -> Self {
        self.max_concurrent_files = Some(limit);
        self
    }

    /// Record failed items and continue instead of aborting. Default: off.
    pub fn isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = isolate;
        self
    }

    /// Attempts per create operation. Default: 1 (no retry).
    pub fn create_retry_attempts(mut self, attempts: u32) -> Self {
        self.create_retry_attempts = Some(attempts);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the configuration, applying defaults and validating the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a value is out of range or both accounts
    /// point at the same file.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            source_account: self
                .source_account
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_ACCOUNT)),
            destination_account: self
                .destination_account
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION_ACCOUNT)),
            http_client: self.http_client,
            max_concurrent_collections: self.max_concurrent_collections.unwrap_or(1),
            max_concurrent_files: self.max_concurrent_files.unwrap_or(4),
            isolate_failures: self.isolate_failures,
            create_retry_attempts: self.create_retry_attempts.unwrap_or(1),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
