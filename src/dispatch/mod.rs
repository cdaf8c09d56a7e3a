//! Concurrent label extraction.
//!
//! The [`Dispatcher`] fans a batch of images out over a bounded pool of
//! tokio tasks, one task per image, with at most `workers` provider calls
//! outstanding at any instant. Each task is isolated: a failed or panicking
//! extraction is logged with the image id and never affects its siblings.
//! The batch returns once every task has finished (or the optional batch
//! deadline elapses).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use labelscan::{Dispatcher, ImageRecord, RetryConfig, VisionClient};
//!
//! # async fn run() -> labelscan::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .provider(Arc::new(VisionClient::new("AIza-your-key")?))
//!     .workers(10)
//!     .retry(RetryConfig::new())
//!     .build()?;
//!
//! let outcomes = dispatcher
//!     .process_batch(&[ImageRecord::from_path("/img/cat.jpg")])
//!     .await?;
//! let rows = labelscan::dispatch::into_rows(outcomes);
//! # Ok(())
//! # }
//! ```

mod builder;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub use builder::DispatcherBuilder;

use crate::providers::LabelProvider;
use crate::telemetry;
use crate::types::{ExtractionOutcome, ImageRecord, ResultRow};
use crate::{LabelScanError, Result};

/// Default number of concurrent extractions.
pub const DEFAULT_WORKERS: usize = 10;

/// What happens to an image whose extraction failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the image out of the result set.
    #[default]
    Exclude,
    /// Keep the image with an empty label list.
    RecordEmpty,
}

/// Bounded-concurrency label extraction over a batch of images.
pub struct Dispatcher {
    provider: Arc<dyn LabelProvider>,
    workers: usize,
    failure_policy: FailurePolicy,
    batch_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a new builder for configuring the dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout
    }

    /// Extract labels for every image in `images`.
    ///
    /// Returns `(image id, outcome)` pairs in completion order. Under
    /// [`FailurePolicy::Exclude`] failed images are absent from the result;
    /// under [`FailurePolicy::RecordEmpty`] they appear with no labels.
    ///
    /// Fails with `InvalidInput` on an empty batch, before any task starts.
    pub async fn process_batch(
        &self,
        images: &[ImageRecord],
    ) -> Result<Vec<(String, ExtractionOutcome)>> {
        if images.is_empty() {
            return Err(LabelScanError::InvalidInput(
                "image list is empty".to_string(),
            ));
        }

        info!(
            images = images.len(),
            workers = self.workers,
            provider = self.provider.name(),
            "starting label extraction"
        );

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(images.len());

        for image in images {
            let image = image.clone();
            let id = image.id.clone();
            let provider = Arc::clone(&self.provider);
            let permits = Arc::clone(&permits);

            let handle = tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => ExtractionOutcome::from(provider.detect_labels(&image).await),
                    Err(closed) => {
                        ExtractionOutcome::failure(LabelScanError::TaskFailed(closed.to_string()))
                    }
                };
                (image.id, outcome)
            });
            pending.insert(handle.id(), id);
        }

        let deadline = self
            .batch_timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);
        let mut outcomes = Vec::with_capacity(images.len());

        loop {
            let joined = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!(
                                outstanding = tasks.len(),
                                "batch deadline elapsed, aborting outstanding extractions"
                            );
                            tasks.abort_all();
                            break;
                        }
                    }
                }
                None => tasks.join_next_with_id().await,
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((task_id, (id, outcome))) => {
                    pending.remove(&task_id);
                    self.collect(&mut outcomes, id, outcome);
                }
                Err(join_error) => {
                    let id = pending.remove(&join_error.id()).unwrap_or_default();
                    error!(image = %id, error = %join_error, "extraction task panicked");
                    let reason = LabelScanError::TaskFailed(join_error.to_string());
                    self.collect(&mut outcomes, id, ExtractionOutcome::failure(reason));
                }
            }
        }

        for (_, id) in pending.drain() {
            self.collect(&mut outcomes, id, ExtractionOutcome::failure(LabelScanError::Timeout));
        }

        info!(
            images = images.len(),
            collected = outcomes.len(),
            "label extraction completed"
        );
        Ok(outcomes)
    }

    /// Apply the failure policy to one finished task.
    fn collect(
        &self,
        outcomes: &mut Vec<(String, ExtractionOutcome)>,
        id: String,
        outcome: ExtractionOutcome,
    ) {
        match outcome {
            ExtractionOutcome::Success { labels } => {
                metrics::counter!(telemetry::IMAGES_TOTAL, "status" => "ok").increment(1);
                debug!(image = %id, count = labels.len(), "extraction succeeded");
                outcomes.push((id, ExtractionOutcome::Success { labels }));
            }
            ExtractionOutcome::Failure { reason } => {
                metrics::counter!(telemetry::IMAGES_TOTAL, "status" => "error").increment(1);
                error!(image = %id, error = %reason, "label extraction failed");
                if self.failure_policy == FailurePolicy::RecordEmpty {
                    outcomes.push((id, ExtractionOutcome::success(Vec::new())));
                }
            }
        }
    }
}

/// Convert dispatcher output into persistable rows.
///
/// Failed outcomes (which only appear when callers build the list
/// themselves) are skipped.
pub fn into_rows(outcomes: Vec<(String, ExtractionOutcome)>) -> Vec<ResultRow> {
    outcomes
        .into_iter()
        .filter_map(|(id, outcome)| {
            outcome
                .labels()
                .map(|labels| ResultRow::from_labels(id.as_str(), labels))
        })
        .collect()
}
