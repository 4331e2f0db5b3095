//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] into a runnable mirror: it
//! loads both account files, builds a refreshing token source and a Google
//! Drive connector per account, and hands them to the [`MirrorEngine`].
//! Desktop builds enable the `desktop-shims` feature (the default), which
//! supplies `bridge_desktop::ReqwestHttpClient` when the configuration does
//! not inject an `HttpClient`.

pub mod error;

pub use error::{CoreError, Result};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{http::HttpClient, storage::StorageProvider};
use core_auth::{AccountConfig, OAuthFlowManager, RefreshingTokenSource};
use core_runtime::logging::redact_if_sensitive;
use core_runtime::{CoreConfig, EventBus, EventSink, FanoutSink, TracingEventSink};
use core_sync::{CreateRetryPolicy, FailurePolicy, MirrorConfig, MirrorEngine, MirrorReport};
use provider_google_drive::GoogleDriveConnector;
use tracing::info;

/// Authenticated handles for both sides of a mirror.
pub struct MirrorAccounts {
    pub source: Arc<dyn StorageProvider>,
    pub destination: Arc<dyn StorageProvider>,
}

/// Primary façade exposed to hosts such as the CLI.
pub struct CoreService {
    config: CoreConfig,
    events: EventBus,
}

impl CoreService {
    /// Create a new service from a validated configuration.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            events: EventBus::default(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Bus carrying every event of the runs started by this service.
    ///
    /// Subscribe before calling [`CoreService::run`] to see the whole run.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Engine settings derived from the runtime configuration.
    pub fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            max_concurrent_collections: self.config.max_concurrent_collections,
            max_concurrent_files: self.config.max_concurrent_files,
            failure_policy: if self.config.isolate_failures {
                FailurePolicy::Isolate
            } else {
                FailurePolicy::FailFast
            },
            create_retry: CreateRetryPolicy::with_attempts(self.config.create_retry_attempts),
        }
    }

    /// Load both account files and build one connector per account.
    ///
    /// No network traffic happens here; tokens are fetched on first use.
    pub fn connect(&self) -> Result<MirrorAccounts> {
        let http_client = self.http_client()?;
        Ok(MirrorAccounts {
            source: connect_account(&self.config.source_account, http_client.clone())?,
            destination: connect_account(&self.config.destination_account, http_client)?,
        })
    }

    /// Run one mirror pass from the source account to the destination.
    pub async fn run(&self) -> Result<MirrorReport> {
        let accounts = self.connect()?;
        self.run_with(accounts).await
    }

    /// Run one mirror pass over already-connected accounts.
    pub async fn run_with(&self, accounts: MirrorAccounts) -> Result<MirrorReport> {
        let sink: Arc<dyn EventSink> = Arc::new(
            FanoutSink::new()
                .with_sink(Arc::new(TracingEventSink))
                .with_sink(Arc::new(self.events.clone())),
        );
        let engine = MirrorEngine::new(self.mirror_config(), sink);

        let report = engine
            .run(accounts.source.as_ref(), accounts.destination.as_ref())
            .await?;
        info!(run_id = %report.run_id, "Mirror run finished: {}", report);
        Ok(report)
    }

    fn http_client(&self) -> Result<Arc<dyn HttpClient>> {
        match &self.config.http_client {
            Some(client) => Ok(client.clone()),
            None => default_http_client(&self.config),
        }
    }
}

fn connect_account(path: &Path, http_client: Arc<dyn HttpClient>) -> Result<Arc<dyn StorageProvider>> {
    let account = AccountConfig::from_file(path)?;
    info!(
        account = %path.display(),
        client_id = %redact_if_sensitive("client_id", &account.client_id),
        "Loaded account"
    );

    let manager = OAuthFlowManager::new(account.oauth_config(), http_client.clone());
    let token_source = RefreshingTokenSource::new(manager, account.refresh_token.clone());
    Ok(Arc::new(GoogleDriveConnector::new(
        http_client,
        Arc::new(token_source),
    )))
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn default_http_client(_config: &CoreConfig) -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new()
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    Ok(Arc::new(client))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
fn default_http_client(config: &CoreConfig) -> Result<Arc<dyn HttpClient>> {
    Ok(config.require_http_client()?)
}
