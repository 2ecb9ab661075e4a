//! Analyzer Configuration Module
//!
//! Provides the analysis thresholds, annotator backend and server settings,
//! loaded from a TOML file with every field defaulting to the base behaviour.
//!
//! ## Loading Order
//!
//! 1. `REPSENSE_CONFIG` environment variable (path to TOML file)
//! 2. `repsense.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(AnalyzerConfig::load());
//!
//! // Anywhere in the codebase:
//! let threshold = config::get().segmenter.threshold;
//! ```

mod analyzer_config;
pub mod defaults;

pub use analyzer_config::*;

use std::sync::OnceLock;

/// Global analyzer configuration, initialized once at startup.
static ANALYZER_CONFIG: OnceLock<AnalyzerConfig> = OnceLock::new();

/// Initialize the global analyzer configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: AnalyzerConfig) {
    if ANALYZER_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global analyzer configuration.
///
/// Falls back to built-in defaults if `init()` was never called.
pub fn get() -> &'static AnalyzerConfig {
    ANALYZER_CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        AnalyzerConfig::default()
    })
}
