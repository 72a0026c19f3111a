//! Editor configuration.
//!
//! Loaded from a TOML file by the host application. Every key is optional;
//! the defaults are shown below.
//!
//! ```toml
//! history_suffix = ".ops"   # History file = image path + this suffix
//! macro_extension = "macro" # Added to macro paths that have no extension
//!
//! [encoding]
//! jpeg_quality = 90         # 1-100, used when saving or exporting JPEG
//!
//! [processing]
//! max_threads = 4           # Filter worker threads (omit for all cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Appended to an image path to locate its history file.
    pub history_suffix: String,
    /// Extension given to macro paths that lack one, without the dot.
    pub macro_extension: String,
    pub encoding: EncodingConfig,
    pub processing: ProcessingConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_suffix: ".ops".to_string(),
            macro_extension: "macro".to_string(),
            encoding: EncodingConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "history_suffix must not be empty".into(),
            ));
        }
        if self.history_suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "history_suffix must not contain path separators".into(),
            ));
        }
        if self.macro_extension.is_empty() || self.macro_extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(
                "macro_extension must be a bare extension such as \"macro\"".into(),
            ));
        }
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of filter worker threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Load config from a TOML file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    if !path.exists() {
        return Ok(EditorConfig::default());
    }
    let content = fs::read_to_string(path)?;
    EditorConfig::from_toml_str(&content)
}

/// Returns a fully-commented stock config with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Retouch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Suffix appended to an image path to find its edit history.
# photo.png keeps its history in photo.png.ops
history_suffix = ".ops"

# Extension given to macro files saved without one.
macro_extension = "macro"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (1-100) for saves and exports to .jpg/.jpeg.
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for filters. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_threads = 4
"##
}
