//! Bearer token sources for the storage connectors.

use crate::error::Result;
use crate::oauth::OAuthFlowManager;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Supplies a valid access token for API requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Token source backed by a refresh token.
///
/// The current token set is cached and only refreshed once it is within the
/// expiry buffer. Concurrent callers share one refresh.
pub struct RefreshingTokenSource {
    manager: OAuthFlowManager,
    refresh_token: String,
    cached: Mutex<Option<OAuthTokens>>,
    clock: Arc<dyn Clock>,
}

impl RefreshingTokenSource {
    pub fn new(manager: OAuthFlowManager, refresh_token: impl Into<String>) -> Self {
        Self::with_clock(manager, refresh_token, Arc::new(SystemClock))
    }

    pub fn with_clock(
        manager: OAuthFlowManager,
        refresh_token: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manager,
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
            clock,
        }
    }
}

#[async_trait]
impl TokenSource for RefreshingTokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(tokens) = cached.as_ref() {
            if !tokens.is_expired_at(self.clock.now()) {
                return Ok(tokens.access_token.clone());
            }
            debug!("Cached access token expiring, refreshing");
        }

        let refresh_token = cached
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .unwrap_or_else(|| self.refresh_token.clone());

        let tokens = self.manager.refresh_access_token(&refresh_token).await?;
        let access_token = tokens.access_token.clone();
        *cached = Some(tokens);

        Ok(access_token)
    }
}

/// Fixed token, for tests and pre-authorized hosts.
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
