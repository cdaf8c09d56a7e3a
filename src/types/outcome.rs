//! Per-image extraction outcome.

use crate::{LabelScanError, Result};

/// Result of extracting labels from one image.
///
/// Labels keep the rank order returned by the vision service; they are
/// never re-sorted or deduplicated.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Success { labels: Vec<String> },
    Failure { reason: LabelScanError },
}

impl ExtractionOutcome {
    pub fn success(labels: Vec<String>) -> Self {
        ExtractionOutcome::Success { labels }
    }

    pub fn failure(reason: LabelScanError) -> Self {
        ExtractionOutcome::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success { .. })
    }

    /// Labels of a successful outcome.
    pub fn labels(&self) -> Option<&[String]> {
        match self {
            ExtractionOutcome::Success { labels } => Some(labels),
            ExtractionOutcome::Failure { .. } => None,
        }
    }

    /// Failure reason, if the extraction failed.
    pub fn reason(&self) -> Option<&LabelScanError> {
        match self {
            ExtractionOutcome::Success { .. } => None,
            ExtractionOutcome::Failure { reason } => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<Vec<String>> {
        match self {
            ExtractionOutcome::Success { labels } => Ok(labels),
            ExtractionOutcome::Failure { reason } => Err(reason),
        }
    }
}

impl From<Result<Vec<String>>> for ExtractionOutcome {
    fn from(result: Result<Vec<String>>) -> Self {
        match result {
            Ok(labels) => ExtractionOutcome::Success { labels },
            Err(reason) => ExtractionOutcome::Failure { reason },
        }
    }
}
