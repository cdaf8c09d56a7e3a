//! labelscan - concurrent image label extraction
//!
//! This crate sends every image of a corpus to the Cloud Vision label
//! detection endpoint under a bounded worker pool, persists the labels found
//! per image, and builds a label frequency histogram from the persisted rows.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use labelscan::{Dispatcher, RetryConfig, VisionClient};
//! use labelscan::{dataset, dispatch, histogram, results};
//!
//! #[tokio::main]
//! async fn main() -> labelscan::Result<()> {
//!     let images = dataset::load_dataset(Path::new("./posters"), &["png", "jpg"])?;
//!
//!     let dispatcher = Dispatcher::builder()
//!         .provider(Arc::new(VisionClient::new("AIza-your-key")?))
//!         .retry(RetryConfig::new())
//!         .build()?;
//!
//!     let rows = dispatch::into_rows(dispatcher.process_batch(&images).await?);
//!     results::save_results(&rows, Path::new("images_results.csv"))?;
//!
//!     let histogram = histogram::build_histogram(&rows);
//!     for (label, count) in histogram.most_common(5) {
//!         println!("{label}: {count}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod histogram;
pub mod providers;
pub mod results;
pub mod telemetry;
pub mod types;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use dispatch::{Dispatcher, DispatcherBuilder, FailurePolicy};
pub use error::{LabelScanError, Result};
pub use histogram::{HistogramOptions, LabelHistogram, build_histogram};
pub use providers::{LabelProvider, RetryConfig, VisionClient};
pub use types::{ExtractionOutcome, ImageRecord, ResultRow};
