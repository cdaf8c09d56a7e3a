//! Retry of transient label extraction failures.
//!
//! A [`RetryConfig`] describes how many times an image is re-submitted and
//! how long to back off in between. [`RetryingLabelProvider`] applies it to
//! any [`LabelProvider`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use super::traits::LabelProvider;
use crate::telemetry;
use crate::types::ImageRecord;
use crate::Result;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Backoff policy for transient extraction errors.
///
/// ```rust
/// # use labelscan::RetryConfig;
/// # use std::time::Duration;
/// // four tries, 250ms then 500ms then 1s between them
/// let config = RetryConfig::new()
///     .max_attempts(4)
///     .initial_delay(Duration::from_millis(250))
///     .jitter(false);
/// assert_eq!(config.delay_for_attempt(2), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries per image, the first one included. `1` never retries.
    pub max_attempts: u32,
    /// Wait before the second try; doubles for each later one.
    pub initial_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
    /// Scale each computed wait by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Three attempts, 500ms initial backoff capped at 30s, jittered.
    pub fn new() -> Self {
        Self::default()
    }

    /// One attempt per image.
    pub fn disabled() -> Self {
        Self::new().max_attempts(1)
    }

    pub fn max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    pub fn initial_delay(self, initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..self
        }
    }

    pub fn max_delay(self, max_delay: Duration) -> Self {
        Self { max_delay, ..self }
    }

    pub fn jitter(self, jitter: bool) -> Self {
        Self { jitter, ..self }
    }

    /// Un-jittered wait after the failed try number `attempt` (0-based):
    /// `initial_delay * 2^attempt`, never above `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Actual wait after a failed try. A server `retry_after` hint is used
    /// as-is; otherwise the backoff is jittered when enabled.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint;
        }
        let backoff = self.delay_for_attempt(attempt);
        if !self.jitter {
            return backoff;
        }
        backoff.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
    }
}

/// Run `extract` until it succeeds, fails permanently, or the configured
/// attempts are used up. Tries are sequential; the last transient error is
/// returned once retries run out.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    image_id: &str,
    extract: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err = match extract().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => err,
        };

        attempt += 1;
        if attempt >= attempts {
            return Err(err);
        }

        let delay = config.effective_delay(attempt - 1, err.retry_after());
        metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider_name.to_owned())
            .increment(1);
        warn!(
            provider = provider_name,
            image = image_id,
            attempt,
            max_attempts = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient extraction error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// A [`LabelProvider`] that re-submits images failing with transient errors
/// (network failures, 408, 429, 5xx). Permanent failures such as a missing
/// path or a rejected key pass straight through.
pub struct RetryingLabelProvider {
    inner: Arc<dyn LabelProvider>,
    config: RetryConfig,
}

impl RetryingLabelProvider {
    pub fn new(inner: Arc<dyn LabelProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LabelProvider for RetryingLabelProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn detect_labels(&self, image: &ImageRecord) -> Result<Vec<String>> {
        let inner = &self.inner;
        with_retry(&self.config, inner.name(), &image.id, || inner.detect_labels(image)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(350))
            .jitter(false);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_half_to_full_delay() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_millis(1000))
            .jitter(true);
        for _ in 0..100 {
            let delay = config.effective_delay(0, None);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn retry_after_hint_wins() {
        let config = RetryConfig::new().jitter(true);
        assert_eq!(
            config.effective_delay(3, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
    }
}
