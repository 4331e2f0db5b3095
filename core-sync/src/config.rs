//! Engine configuration.

use std::time::Duration;

/// What the engine does when an item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run on the first unrecovered error. Outstanding sibling
    /// transfers are cancelled; everything created so far stays created.
    #[default]
    FailFast,
    /// Record the failure in the report and keep processing siblings.
    Isolate,
}

/// Retry policy for create operations.
///
/// Before every retry the engine looks the title up again, so a create that
/// reported an error but actually landed is adopted rather than duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRetryPolicy {
    /// Attempts including the first one; 1 disables retries
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl CreateRetryPolicy {
    pub fn no_retry() -> Self {
        Self::default()
    }

    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Backoff before the given retry (1-based), doubling up to `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
            .min(self.max_delay)
    }
}

impl Default for CreateRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Mirror engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Collections processed at the same time
    pub max_concurrent_collections: usize,
    /// Files processed at the same time within one collection
    pub max_concurrent_files: usize,
    pub failure_policy: FailurePolicy,
    pub create_retry: CreateRetryPolicy,
}

impl MirrorConfig {
    /// One collection and one file at a time.
    pub fn sequential() -> Self {
        Self {
            max_concurrent_collections: 1,
            max_concurrent_files: 1,
            ..Self::default()
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_collections: 1,
            max_concurrent_files: 4,
            failure_policy: FailurePolicy::FailFast,
            create_retry: CreateRetryPolicy::default(),
        }
    }
}
