//! Configuration loading for labelscan.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.labelscan/config.toml` (user)
//! 3. `/etc/labelscan/config.toml` (system)
//! 4. built-in defaults
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.labelscan/secrets.toml` (user, must be 0600)
//! 2. `/etc/labelscan/secrets.toml` (system, must be 0600)
//! 3. the `VISION_API_KEY` environment variable

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::{DEFAULT_WORKERS, FailurePolicy};
use crate::providers::RetryConfig;
use crate::providers::vision::{DEFAULT_BASE_URL, DEFAULT_MAX_RESULTS};
use crate::{LabelScanError, Result};

/// Environment variable consulted when no secrets file holds an API key.
pub const API_KEY_ENV_VAR: &str = "VISION_API_KEY";

/// Full labelscan configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Vision service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// API base URL (default: https://vision.googleapis.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Labels requested per image (default: 10).
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Per-request HTTP timeout in seconds (default: 60).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_results: default_max_results(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_request_timeout() -> u64 {
    60
}

/// Worker pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Concurrent extractions (default: 10).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Whole-batch deadline in seconds (default: none).
    #[serde(default)]
    pub batch_timeout_secs: Option<u64>,
    /// What to do with images whose extraction failed (default: exclude).
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_timeout_secs: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl DispatchConfig {
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_secs.map(Duration::from_secs)
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Retry settings, in TOML-friendly units.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts per image including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        RetryConfig::new()
            .max_attempts(section.max_attempts)
            .initial_delay(Duration::from_millis(section.initial_delay_ms))
            .max_delay(Duration::from_millis(section.max_delay_ms))
            .jitter(section.jitter)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter() -> bool {
    true
}

/// Dataset scan settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// File extensions treated as images (default: png, jpg).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string()]
}

/// Result file and analysis settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Result table path (default: images_results.csv).
    #[serde(default = "default_results")]
    pub results: PathBuf,
    /// Build the label histogram after saving (default: true).
    #[serde(default = "default_graph")]
    pub graph: bool,
    /// Drop empty tokens from the histogram (default: false).
    #[serde(default)]
    pub skip_empty_labels: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results: default_results(),
            graph: default_graph(),
            skip_empty_labels: false,
        }
    }
}

fn default_results() -> PathBuf {
    PathBuf::from("images_results.csv")
}

fn default_graph() -> bool {
    true
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub vision: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path that does not exist is an error; with no explicit
    /// path and no file in the standard locations, defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(LabelScanError::Configuration(format!(
                    "Config file not found: {path:?}"
                )));
            }
            return read_toml(path, "config");
        }

        match first_existing(CONFIG_FILE) {
            Some(path) => read_toml(&path, "config"),
            None => Ok(Config::default()),
        }
    }
}

impl Secrets {
    /// Load secrets from the standard locations.
    ///
    /// A secrets file readable by group or others is refused. No file at all
    /// yields empty secrets; the key may still come from the environment.
    pub fn load() -> Result<Self> {
        match first_existing(SECRETS_FILE) {
            Some(path) => {
                ensure_private(&path)?;
                read_toml(&path, "secrets")
            }
            None => Ok(Secrets::default()),
        }
    }

    /// Vision API key, falling back to the `VISION_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        let non_empty = |key: &String| !key.is_empty();
        self.vision
            .as_ref()
            .map(|s| s.api_key.clone())
            .filter(non_empty)
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok().filter(non_empty))
    }
}

const CONFIG_FILE: &str = "config.toml";
const SECRETS_FILE: &str = "secrets.toml";

/// `~/.labelscan/<file>` then `/etc/labelscan/<file>`.
fn first_existing(file: &str) -> Option<PathBuf> {
    let user = dirs::home_dir().map(|home| home.join(".labelscan").join(file));
    let system = Path::new("/etc/labelscan").join(file);
    user.into_iter().chain([system]).find(|path| path.exists())
}

fn read_toml<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        LabelScanError::Configuration(format!("Failed to read {kind} file {path:?}: {e}"))
    })?;
    toml::from_str(&content).map_err(|e| {
        LabelScanError::Configuration(format!("Failed to parse {kind} file {path:?}: {e}"))
    })
}

/// Secrets must be 0600 or 0400.
#[cfg(unix)]
fn ensure_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)
        .map_err(|e| LabelScanError::io(path, e))?
        .permissions()
        .mode();
    if mode & 0o077 != 0 {
        return Err(LabelScanError::Configuration(format!(
            "secrets file {path:?} is accessible by other users (mode {:o})",
            mode & 0o777
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.vision.base_url, "https://vision.googleapis.com");
        assert_eq!(config.vision.max_results, 10);
        assert_eq!(config.dispatch.workers, 10);
        assert_eq!(config.dispatch.batch_timeout(), None);
        assert_eq!(config.dispatch.failure_policy, FailurePolicy::Exclude);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.dataset.extensions, vec!["png", "jpg"]);
        assert_eq!(config.output.results, PathBuf::from("images_results.csv"));
        assert!(config.output.graph);
        assert!(!config.output.skip_empty_labels);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [dispatch]
            workers = 4
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.dispatch.workers, 4);
        // Defaults preserved
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.vision.max_results, 10);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [vision]
            base_url = "http://localhost:8080"
            max_results = 5
            request_timeout_secs = 10

            [dispatch]
            workers = 2
            batch_timeout_secs = 60
            failure_policy = "record_empty"

            [retry]
            max_attempts = 5
            initial_delay_ms = 100
            max_delay_ms = 2000
            jitter = false

            [dataset]
            extensions = ["jpeg", "webp"]

            [output]
            results = "/tmp/labels.csv"
            graph = false
            skip_empty_labels = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.vision.base_url, "http://localhost:8080");
        assert_eq!(config.vision.max_results, 5);
        assert_eq!(config.dispatch.batch_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.dispatch.failure_policy, FailurePolicy::RecordEmpty);
        assert_eq!(config.dataset.extensions, vec!["jpeg", "webp"]);
        assert!(!config.output.graph);
        assert!(config.output.skip_empty_labels);

        let retry = RetryConfig::from(&config.retry);
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(100));
        assert_eq!(retry.max_delay, Duration::from_secs(2));
        assert!(!retry.jitter);
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [vision]
            api_key = "AIza-test-key"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.api_key(), Some("AIza-test-key".to_string()));
    }

    // The only test touching VISION_API_KEY; keep it that way so parallel
    // tests never observe a half-set environment.
    #[test]
    fn api_key_falls_back_to_environment() {
        let from_file: Secrets = toml::from_str("[vision]\napi_key = \"file-key\"").unwrap();
        let blank_file: Secrets = toml::from_str("[vision]\napi_key = \"\"").unwrap();

        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };
        assert_eq!(Secrets::default().api_key(), None);
        assert_eq!(blank_file.api_key(), None);

        unsafe { std::env::set_var(API_KEY_ENV_VAR, "env-key") };
        assert_eq!(Secrets::default().api_key(), Some("env-key".to_string()));
        assert_eq!(blank_file.api_key(), Some("env-key".to_string()));
        assert_eq!(from_file.api_key(), Some("file-key".to_string()));

        unsafe { std::env::set_var(API_KEY_ENV_VAR, "") };
        assert_eq!(Secrets::default().api_key(), None);

        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\ngraph = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.output.graph);
    }

    #[cfg(unix)]
    #[test]
    fn world_readable_secrets_are_refused() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "[vision]\napi_key = \"k\"\n").unwrap();

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            ensure_private(&path),
            Err(LabelScanError::Configuration(_))
        ));

        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        assert!(ensure_private(&path).is_ok());
    }
}
