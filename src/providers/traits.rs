//! Provider trait for label extraction.
//!
//! A [`LabelProvider`] turns one image into an ordered list of labels.
//! The dispatcher only depends on this trait, which enables:
//! - Decorator patterns: `RetryingLabelProvider`
//! - Test doubles that count calls or fail on demand
//! - Sharing one provider across every worker (`Arc<dyn LabelProvider>`)
//!
//! # Example
//!
//! ```ignore
//! async fn detect_labels(&self, image: &ImageRecord) -> Result<Vec<String>> {
//!     if !image.has_path() {
//!         return Err(LabelScanError::MissingPath(image.id.clone()));
//!     }
//!     // ... call the service
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::ImageRecord;

/// Provider for image labels.
///
/// Implementations must be stateless per call: the same provider instance
/// is shared by every concurrent worker.
#[async_trait]
pub trait LabelProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Detect labels for a single image.
    ///
    /// Labels are returned in the service's relevance order. An image the
    /// service recognizes nothing in yields `Ok(vec![])`, not an error.
    async fn detect_labels(&self, image: &ImageRecord) -> Result<Vec<String>>;
}
