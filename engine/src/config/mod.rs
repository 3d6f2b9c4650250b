//! Configuration management
//!
//! This module handles loading, validation, and management of the Essaymark
//! configuration. Configuration is stored in TOML format at
//! ~/.essaymark/config.toml unless another path is given on the command line.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **server**: Listen address and static file directory
//! - **llm**: Generative-text provider settings
//! - **marking**: Scoring scale policy
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Creates the data directory if it doesn't exist
//!
//! The Gemini API key is never stored here. `llm.gemini.api_key_env` names
//! the environment variable it is read from.
//!
//! # Examples
//!
//! ```no_run
//! use essaymark_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data directory: {:?}", config.core.data_dir);
//! println!("Listening on {}:{}", config.server.host, config.server.port);
//! # Ok(())
//! # }
//! ```

use crate::feedback::{ScalePolicy, ScoringScale};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Only `[core]` is required; every other section falls back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Essay marking settings
    #[serde(default)]
    pub marking: MarkingConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding users.json and essays.json (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind; 0 picks a free port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for any path not matched by the API
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Essay marking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkingConfig {
    /// "random" picks a scale per submission, "fixed" always uses `fixed_scale`
    #[serde(default = "default_scale_policy")]
    pub scale_policy: String,

    /// Maximum points when `scale_policy = "fixed"` (20, 25, 30 or 100)
    #[serde(default = "default_fixed_scale")]
    pub fixed_scale: u32,
}

impl MarkingConfig {
    /// Resolve the configured policy
    pub fn policy(&self) -> Result<ScalePolicy, EngineError> {
        match self.scale_policy.as_str() {
            "random" => Ok(ScalePolicy::Random),
            "fixed" => {
                let scale = ScoringScale::from_max_points(self.fixed_scale).ok_or_else(|| {
                    EngineError::Config(format!(
                        "Invalid fixed_scale {}. Must be one of: {}",
                        self.fixed_scale,
                        ScoringScale::ALL
                            .iter()
                            .map(|s| s.max_points().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
                Ok(ScalePolicy::Fixed(scale))
            }
            other => Err(EngineError::Config(format!(
                "Invalid scale_policy '{}'. Must be one of: random, fixed",
                other
            ))),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_scale_policy() -> String {
    "random".to_string()
}

fn default_fixed_scale() -> u32 {
    100
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            scale_policy: default_scale_policy(),
            fixed_scale: default_fixed_scale(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.essaymark/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable defaults
        let mut config = Self::default_config();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.essaymark/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".essaymark").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            server: ServerConfig::default(),
            llm: LLMConfig::default(),
            marking: MarkingConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates enumerated and numeric fields
    /// - Expands ~ in paths
    /// - Creates the data directory if it doesn't exist
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.server.host.trim().is_empty() {
            return Err(EngineError::Config("server.host must not be empty".to_string()));
        }

        if self.llm.gemini.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.gemini.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.gemini.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.gemini.api_key_env must name an environment variable".to_string(),
            ));
        }

        self.marking.policy()?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }
        if !self.core.data_dir.is_dir() {
            return Err(EngineError::Config(format!(
                "Data path is not a directory: {:?}",
                self.core.data_dir
            )));
        }

        if let Some(static_dir) = &self.server.static_dir {
            self.server.static_dir = Some(expand_path(static_dir)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
