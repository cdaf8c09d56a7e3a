//! Builder for configuring dispatcher instances

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::{DEFAULT_WORKERS, Dispatcher, FailurePolicy};
use crate::config::Config;
use crate::providers::{LabelProvider, RetryConfig, RetryingLabelProvider};
use crate::{LabelScanError, Result};

/// Builder for configuring dispatcher instances.
pub struct DispatcherBuilder {
    provider: Option<Arc<dyn LabelProvider>>,
    workers: usize,
    retry_config: Option<RetryConfig>,
    failure_policy: FailurePolicy,
    batch_timeout: Option<Duration>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            workers: DEFAULT_WORKERS,
            retry_config: None,
            failure_policy: FailurePolicy::default(),
            batch_timeout: None,
        }
    }

    /// Seed the builder from the `[dispatch]` and `[retry]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .workers(config.dispatch.workers)
            .failure_policy(config.dispatch.failure_policy)
            .batch_timeout(config.dispatch.batch_timeout())
            .retry(RetryConfig::from(&config.retry))
    }

    /// Provider shared by every worker.
    pub fn provider(mut self, provider: Arc<dyn LabelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Maximum number of concurrent extractions (default: 10).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Wrap the provider with retry on transient errors.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    /// Call the provider exactly once per image.
    pub fn disable_retry(mut self) -> Self {
        self.retry_config = None;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Abort outstanding extractions once the batch has run this long.
    pub fn batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<Dispatcher> {
        let provider = self.provider.ok_or_else(|| {
            LabelScanError::Configuration("no label provider configured".to_string())
        })?;

        if self.workers == 0 {
            return Err(LabelScanError::Configuration(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        if self.workers > Semaphore::MAX_PERMITS {
            return Err(LabelScanError::Configuration(format!(
                "worker pool size must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        let provider: Arc<dyn LabelProvider> = match self.retry_config {
            Some(config) => Arc::new(RetryingLabelProvider::new(provider, config)),
            None => provider,
        };

        Ok(Dispatcher {
            provider,
            workers: self.workers,
            failure_policy: self.failure_policy,
            batch_timeout: self.batch_timeout,
        })
    }
}
