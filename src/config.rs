//! Decoder configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via TNTSCOPE_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by `main`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tntscope_protocol::FormatOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder configuration.
    pub decoder: DecoderConfig,
    /// Input configuration.
    pub input: InputConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads configuration from `path` if given, then applies environment
    /// variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.decoder.apply_env_overrides();
        self.input.apply_env_overrides();
        self.output.apply_env_overrides();
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decoder.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "decoder.max_depth must be at least 1".to_string(),
            ));
        }
        if self.input.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "input.chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Nesting depth past which values render as `...`.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: FormatOptions::DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(depth) = std::env::var("TNTSCOPE_MAX_DEPTH") {
            if let Ok(n) = depth.parse() {
                self.max_depth = n;
            }
        }
    }

    /// Returns the formatter options for this configuration.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions::default().with_max_depth(self.max_depth)
    }
}

/// Input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Bytes handed to the decoder per delivery.
    pub chunk_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { chunk_size: 4096 }
    }
}

impl InputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var("TNTSCOPE_CHUNK_SIZE") {
            if let Ok(n) = size.parse() {
                self.chunk_size = n;
            }
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Summary line plus indented annotations.
    #[default]
    Tree,
    /// One summary line per packet.
    Summary,
    /// One JSON object per packet.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(OutputFormat::Tree),
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Colorize terminal output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Tree,
            color: true,
        }
    }
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(format) = std::env::var("TNTSCOPE_OUTPUT") {
            match format.parse() {
                Ok(parsed) => self.format = parsed,
                Err(e) => tracing::warn!("ignoring TNTSCOPE_OUTPUT: {}", e),
            }
        }

        if let Ok(color) = std::env::var("TNTSCOPE_COLOR") {
            self.color = color == "1" || color.to_lowercase() == "true";
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
