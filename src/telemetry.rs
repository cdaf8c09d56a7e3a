//! Telemetry metric name constants.
//!
//! Centralised metric names for labelscan operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `labelscan_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "vision")
//! - `status`: outcome, "ok" or "error"

/// Total HTTP requests sent to the vision service (one per attempt).
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "labelscan_requests_total";

/// Request duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "labelscan_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "labelscan_retries_total";

/// Images processed by the dispatcher.
///
/// Labels: `status` ("ok" | "error").
pub const IMAGES_TOTAL: &str = "labelscan_images_total";
