//! Label providers.
//!
//! [`VisionClient`] talks to the Cloud Vision API; [`RetryingLabelProvider`]
//! adds the retry policy on top of any [`LabelProvider`].

pub mod retry;
pub mod traits;
pub mod vision;

pub use retry::{RetryConfig, RetryingLabelProvider};
pub use traits::LabelProvider;
pub use vision::{VisionClient, parse_annotate_response};
