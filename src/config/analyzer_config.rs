//! Analyzer Configuration - segmentation, report, annotator and server settings
//!
//! Each struct implements `Default` with the base-design values, so running
//! without a config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "REPSENSE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "repsense.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an analyzer deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Repetition segmentation
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Cross-repetition report
    #[serde(default)]
    pub report: ReportConfig,

    /// Annotation provider
    #[serde(default)]
    pub annotator: AnnotatorConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl AnalyzerConfig {
    /// Load configuration using the standard search order:
    /// 1. `$REPSENSE_CONFIG`
    /// 2. `./repsense.toml`
    /// 3. Built-in defaults
    ///
    /// Environment overrides are applied on top of whichever source wins.
    pub fn load() -> Self {
        let explicit = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        Self::load_with_path(explicit.as_deref())
    }

    /// Same as [`load()`](Self::load) but with an explicit file taking the
    /// place of `$REPSENSE_CONFIG` (e.g. from the `--config` flag).
    pub fn load_with_path(explicit: Option<&Path>) -> Self {
        let mut config = Self::search(explicit);
        config.apply_env_overrides();
        if let Err(e) = config.validate() {
            warn!(error = %e, "Environment overrides produced an invalid config, using defaults");
            return Self::default();
        }
        config
    }

    fn search(explicit: Option<&Path>) -> Self {
        if let Some(p) = explicit {
            if p.exists() {
                match Self::load_from_file(p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analyzer config");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load analyzer config, falling back");
                    }
                }
            } else {
                warn!(path = %p.display(), "Config path does not exist, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analyzer config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// `REPSENSE_ANNOTATOR_URL`, `REPSENSE_ANNOTATOR_API_KEY` and
    /// `REPSENSE_SERVER_ADDR` win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("REPSENSE_ANNOTATOR_URL") {
            self.annotator.url = url;
        }
        if let Ok(key) = std::env::var("REPSENSE_ANNOTATOR_API_KEY") {
            self.annotator.api_key = Some(key);
        }
        if let Ok(addr) = std::env::var("REPSENSE_SERVER_ADDR") {
            self.server.addr = addr;
        }
    }

    /// Apply command-line overrides and re-check the result.
    pub fn apply_cli_overrides(
        &mut self,
        addr: Option<String>,
        force_synthetic: bool,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if force_synthetic {
            self.annotator.backend = AnnotatorBackend::Synthetic;
        }
        self.validate()
    }

    /// Validate every section, collecting all violations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.segmenter;
        if !s.threshold.is_finite() {
            errors.push(format!("segmenter.threshold must be finite, got {}", s.threshold));
        }
        if s.min_frames == 0 {
            errors.push("segmenter.min_frames must be > 0".to_string());
        }
        if let Some(max) = s.max_rep_duration_secs {
            if !(max.is_finite() && max > 0.0) {
                errors.push(format!(
                    "segmenter.max_rep_duration_secs must be positive, got {max}"
                ));
            }
        }

        if self.report.min_reps == 0 {
            errors.push("report.min_reps must be > 0".to_string());
        }

        let a = &self.annotator;
        if a.timeout_secs == 0 {
            errors.push("annotator.timeout_secs must be > 0".to_string());
        }
        if a.backend == AnnotatorBackend::Http && a.url.trim().is_empty() {
            errors.push("annotator.url is required for the http backend".to_string());
        }
        if a.backend == AnnotatorBackend::Synthetic && a.synthetic_peak_angle <= 0.0 {
            errors.push(format!(
                "annotator.synthetic_peak_angle must be positive, got {}",
                a.synthetic_peak_angle
            ));
        }
        if a.frame_width == 0 || a.frame_height == 0 {
            errors.push(format!(
                "annotator frame size must be non-zero, got {}x{}",
                a.frame_width, a.frame_height
            ));
        }
        if !(1..=100).contains(&a.jpeg_quality) {
            errors.push(format!(
                "annotator.jpeg_quality must be in 1..=100, got {}",
                a.jpeg_quality
            ));
        }

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Segmenter
// ============================================================================

/// What happens to a repetition that stays open longer than
/// `max_rep_duration_secs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlongPolicy {
    /// Drop the buffered samples, nothing is appended to history.
    #[default]
    Discard,
    /// Finalize with whatever has been buffered, ignoring `min_frames`.
    ForceClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Hysteresis threshold in degrees
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Buffer length a repetition must exceed before it may close
    #[serde(default = "default_min_frames")]
    pub min_frames: usize,

    /// Guard against repetitions that never close. Disabled when absent.
    #[serde(default)]
    pub max_rep_duration_secs: Option<f64>,

    #[serde(default)]
    pub overlong_policy: OverlongPolicy,
}

fn default_threshold() -> f64 {
    defaults::REP_THRESHOLD_DEG
}

fn default_min_frames() -> usize {
    defaults::MIN_FRAMES_PER_REP
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_frames: default_min_frames(),
            max_rep_duration_secs: None,
            overlong_policy: OverlongPolicy::default(),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Completed repetitions required before a report is produced
    #[serde(default = "default_min_reps")]
    pub min_reps: usize,
}

fn default_min_reps() -> usize {
    defaults::MIN_REPS_FOR_REPORT
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_reps: default_min_reps(),
        }
    }
}

// ============================================================================
// Annotator
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotatorBackend {
    /// Remote vision provider over HTTP
    #[default]
    Http,
    /// Simulated stretch cycles, for demos and soak tests
    Synthetic,
}

impl std::fmt::Display for AnnotatorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotatorBackend::Http => write!(f, "http"),
            AnnotatorBackend::Synthetic => write!(f, "synthetic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    #[serde(default)]
    pub backend: AnnotatorBackend,

    /// Provider endpoint receiving `{image, media_type}` POSTs
    #[serde(default = "default_annotator_url")]
    pub url: String,

    /// Bearer token for the provider. Never echoed back by the API.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Upper bound on a single annotation call
    #[serde(default = "default_annotation_timeout")]
    pub timeout_secs: u64,

    /// Seed for the synthetic backend's noise
    #[serde(default)]
    pub synthetic_seed: u64,

    #[serde(default = "default_synthetic_cycle_ms")]
    pub synthetic_cycle_ms: i64,

    #[serde(default = "default_synthetic_peak_angle")]
    pub synthetic_peak_angle: f64,

    /// Width of raw RGBA frames (pixels)
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Height of raw RGBA frames (pixels)
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// JPEG quality (1-100) for re-encoded raw frames
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_annotator_url() -> String {
    "http://127.0.0.1:9000/annotate".to_string()
}

fn default_annotation_timeout() -> u64 {
    defaults::ANNOTATION_TIMEOUT_SECS
}

fn default_synthetic_cycle_ms() -> i64 {
    defaults::SYNTHETIC_CYCLE_MS
}

fn default_synthetic_peak_angle() -> f64 {
    defaults::SYNTHETIC_PEAK_ANGLE_DEG
}

fn default_frame_width() -> u32 {
    defaults::FRAME_WIDTH_PX
}

fn default_frame_height() -> u32 {
    defaults::FRAME_HEIGHT_PX
}

fn default_jpeg_quality() -> u8 {
    defaults::JPEG_QUALITY
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            backend: AnnotatorBackend::default(),
            url: default_annotator_url(),
            api_key: None,
            timeout_secs: default_annotation_timeout(),
            synthetic_seed: 0,
            synthetic_cycle_ms: default_synthetic_cycle_ms(),
            synthetic_peak_angle: default_synthetic_peak_angle(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl AnnotatorConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `REPSENSE_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validates() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segmenter.threshold, 15.0);
        assert_eq!(config.segmenter.min_frames, 6);
        assert_eq!(config.segmenter.max_rep_duration_secs, None);
        assert_eq!(config.report.min_reps, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
            [segmenter]
            threshold = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.segmenter.threshold, 20.0);
        assert_eq!(config.segmenter.min_frames, 6);
        assert_eq!(config.annotator.backend, AnnotatorBackend::Http);
    }

    #[test]
    fn test_overlong_policy_parses() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
            [segmenter]
            max_rep_duration_secs = 12.5
            overlong_policy = "force_close"
            "#,
        )
        .unwrap();
        assert_eq!(config.segmenter.max_rep_duration_secs, Some(12.5));
        assert_eq!(config.segmenter.overlong_policy, OverlongPolicy::ForceClose);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AnalyzerConfig::default();
        config.segmenter.min_frames = 0;
        config.segmenter.max_rep_duration_secs = Some(-1.0);
        config.report.min_reps = 0;
        config.annotator.timeout_secs = 0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_http_backend_requires_url() {
        let mut config = AnalyzerConfig::default();
        config.annotator.url = "  ".to_string();
        assert!(config.validate().is_err());

        config.annotator.backend = AnnotatorBackend::Synthetic;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_are_validated() {
        let mut config = AnalyzerConfig::default();
        let err = config
            .apply_cli_overrides(Some(String::new()), false)
            .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("server.addr")), "got {errors:?}");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_synthetic_override_skips_url_check() {
        let mut config = AnalyzerConfig::default();
        config.annotator.url = String::new();
        config
            .apply_cli_overrides(Some("127.0.0.1:9100".to_string()), true)
            .unwrap();
        assert_eq!(config.annotator.backend, AnnotatorBackend::Synthetic);
        assert_eq!(config.server.addr, "127.0.0.1:9100");
    }

    #[test]
    fn test_raw_frame_geometry_validated() {
        let mut config = AnalyzerConfig::default();
        assert_eq!((config.annotator.frame_width, config.annotator.frame_height), (640, 480));
        config.annotator.frame_height = 0;
        config.annotator.jpeg_quality = 0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = AnalyzerConfig::default();
        config.annotator.api_key = Some("secret".to_string());
        let toml = config.to_toml().unwrap();
        assert!(!toml.contains("secret"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nmin_reps = 5\n[annotator]\nbackend = \"synthetic\"").unwrap();

        let config = AnalyzerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.report.min_reps, 5);
        assert_eq!(config.annotator.backend, AnnotatorBackend::Synthetic);
    }

    #[test]
    fn test_load_from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[segmenter\nthreshold = ").unwrap();

        let err = AnalyzerConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(ref p, _) if p == file.path()));
    }
}
