//! Cloud Vision API client for label detection.
//!
//! Sends one `images:annotate` request per image with a single
//! `LABEL_DETECTION` feature.
//! See: <https://cloud.google.com/vision/docs/labels>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::traits::LabelProvider;
use crate::config::VisionConfig;
use crate::telemetry;
use crate::types::ImageRecord;
use crate::{LabelScanError, Result};

/// Default base URL for the Cloud Vision API
pub const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// Default cap on labels requested per image.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

const PROVIDER_NAME: &str = "vision";

/// Header carrying the API key; keeps it out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Cloud Vision `images:annotate` endpoint.
///
/// Cheap to clone; the underlying HTTP connection pool is shared, so a
/// single instance serves every dispatcher worker.
#[derive(Clone)]
pub struct VisionClient {
    api_key: HeaderValue,
    http: Client,
    base_url: String,
    max_results: u32,
}

impl VisionClient {
    /// Create a new client with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(api_key, &VisionConfig::default())
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let config = VisionConfig {
            base_url: base_url.into(),
            ..VisionConfig::default()
        };
        Self::from_config(api_key, &config)
    }

    /// Create a client from the `[vision]` configuration section.
    pub fn from_config(api_key: impl Into<String>, config: &VisionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                LabelScanError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let mut api_key = HeaderValue::try_from(api_key.into()).map_err(|_| {
            LabelScanError::Configuration("API key is not a valid header value".to_string())
        })?;
        api_key.set_sensitive(true);

        Ok(Self {
            api_key,
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    /// Maximum number of labels requested per image.
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Extract labels for one image.
    ///
    /// Fails with `MissingPath` before any I/O when the record has no path.
    pub async fn annotate(&self, image: &ImageRecord) -> Result<Vec<String>> {
        if !image.has_path() {
            return Err(LabelScanError::MissingPath(image.id.clone()));
        }

        let raw = tokio::fs::read(&image.path)
            .await
            .map_err(|e| LabelScanError::io(&image.path, e))?;
        let content = BASE64.encode(&raw);

        let request = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent { content: &content },
                features: [Feature {
                    kind: "LABEL_DETECTION",
                    max_results: self.max_results,
                }],
            }],
        };

        let start = Instant::now();
        let body = self.send(&request).await;
        Self::record_request(start, body.is_ok());

        let labels = parse_annotate_response(&body?)?;
        info!(image = %image.id, count = labels.len(), "labels found");
        Ok(labels)
    }

    async fn send(&self, request: &AnnotateRequest<'_>) -> Result<Vec<u8>> {
        let url = format!("{}/v1/images:annotate", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.clone())
            .json(request)
            .send()
            .await?;

        Self::handle_response_errors(&response)?;

        Ok(response.bytes().await?.to_vec())
    }

    /// Check response status and map to appropriate error.
    fn handle_response_errors(response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(LabelScanError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(LabelScanError::RateLimited { retry_after })
            }
            code => Err(LabelScanError::Api {
                status: code,
                message: format!("Vision API error: {status}"),
            }),
        }
    }

    fn record_request(start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => PROVIDER_NAME,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => PROVIDER_NAME,
        )
        .record(start.elapsed().as_secs_f64());
    }
}

/// Turn a raw `images:annotate` response body into an ordered label list.
///
/// - empty body, `null` or `{}` is an [`EmptyResponse`](LabelScanError::EmptyResponse)
/// - a missing `responses` envelope, or one that does not hold exactly one
///   entry, is logged and yields no labels
/// - annotations without a description are skipped
pub fn parse_annotate_response(body: &[u8]) -> Result<Vec<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(LabelScanError::EmptyResponse);
    }

    let value: serde_json::Value = serde_json::from_slice(body)?;
    match &value {
        serde_json::Value::Null => return Err(LabelScanError::EmptyResponse),
        serde_json::Value::Object(map) if map.is_empty() => {
            return Err(LabelScanError::EmptyResponse);
        }
        _ => {}
    }

    let envelope: BatchAnnotateResponse = serde_json::from_value(value)?;
    let Some(responses) = envelope.responses else {
        error!("no responses found");
        return Ok(Vec::new());
    };

    let response = match <[AnnotateImageResponse; 1]>::try_from(responses) {
        Ok([response]) => response,
        Err(responses) => {
            error!(count = responses.len(), "expected exactly one annotate response");
            return Ok(Vec::new());
        }
    };

    if let Some(status) = &response.error {
        warn!(
            code = status.code,
            message = status.message.as_deref().unwrap_or_default(),
            "vision service reported an image error"
        );
    }

    Ok(response
        .label_annotations
        .unwrap_or_default()
        .into_iter()
        .filter_map(|annotation| annotation.description)
        .collect())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent<'a>,
    features: [Feature; 1],
}

#[derive(Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Deserialize)]
struct BatchAnnotateResponse {
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    label_annotations: Option<Vec<LabelAnnotation>>,
    error: Option<Status>,
}

#[derive(Deserialize)]
struct LabelAnnotation {
    description: Option<String>,
}

#[derive(Deserialize)]
struct Status {
    code: Option<i32>,
    message: Option<String>,
}

// ============================================================================
// Provider Trait Implementation
// ============================================================================

#[async_trait]
impl LabelProvider for VisionClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn detect_labels(&self, image: &ImageRecord) -> Result<Vec<String>> {
        self.annotate(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_keep_service_order_and_duplicates() {
        let body = br#"{"responses": [{"labelAnnotations": [
            {"description": "cat", "score": 0.98},
            {"description": "cat", "score": 0.91},
            {"description": "dog", "score": 0.52}
        ]}]}"#;
        let labels = parse_annotate_response(body).unwrap();
        assert_eq!(labels, vec!["cat", "cat", "dog"]);
    }

    #[test]
    fn missing_responses_envelope_yields_no_labels() {
        let labels = parse_annotate_response(br#"{"kind": "unexpected"}"#).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn wrong_number_of_responses_yields_no_labels() {
        let two = br#"{"responses": [{"labelAnnotations": [{"description": "a"}]}, {}]}"#;
        assert!(parse_annotate_response(two).unwrap().is_empty());

        let none = br#"{"responses": []}"#;
        assert!(parse_annotate_response(none).unwrap().is_empty());
    }

    #[test]
    fn annotations_without_description_are_skipped() {
        let body = br#"{"responses": [{"labelAnnotations": [
            {"mid": "/m/01yrx"},
            {"description": "whiskers"}
        ]}]}"#;
        assert_eq!(parse_annotate_response(body).unwrap(), vec!["whiskers"]);
    }

    #[test]
    fn response_without_annotations_yields_no_labels() {
        assert!(parse_annotate_response(br#"{"responses": [{}]}"#).unwrap().is_empty());
    }

    #[test]
    fn per_image_error_yields_no_labels() {
        let body = br#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#;
        assert!(parse_annotate_response(body).unwrap().is_empty());
    }

    #[test]
    fn absent_response_is_an_error() {
        for body in [&b""[..], b"  \n", b"null", b"{}"] {
            assert!(matches!(
                parse_annotate_response(body),
                Err(LabelScanError::EmptyResponse)
            ));
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_annotate_response(b"{not json"),
            Err(LabelScanError::Json(_))
        ));
    }

    #[test]
    fn request_serializes_to_vision_wire_format() {
        let request = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent { content: "aGVsbG8=" },
                features: [Feature {
                    kind: "LABEL_DETECTION",
                    max_results: 10,
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{
                    "image": {"content": "aGVsbG8="},
                    "features": [{"type": "LABEL_DETECTION", "maxResults": 10}]
                }]
            })
        );
    }
}
