//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from, in priority order:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`RSA_ROOT_FOLDER`, then `RSA_ROOT`)
//! 3. TOML config file (`~/.config/rsa/<module>.toml`)
//! 4. OS-dependent compiled defaults
//!
//! A missing or unreadable TOML file never aborts startup. The service logs a
//! warning and carries on with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for the demo service
pub const DEFAULT_PORT: u16 = 5780;

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATASET: &str = "reviews_test.tsv";

/// Default sentiment model on the Hugging Face hub
pub const DEFAULT_MODEL: &str = "distilbert/distilbert-base-uncased-finetuned-sst-2-english";

/// Hugging Face hub base URL (model metadata)
pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Hugging Face serverless inference base URL (router); requests need a token
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";

/// Default remote collector for interaction logs
pub const DEFAULT_LOG_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbzvtl4PCYjL4dAb-CMivEmZ_4qjBP1P8l0siybU71lsqEi7wQ5GFljyMMX-0Tn8aJpDow/exec";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "rsa.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/rsa
        dirs::data_dir()
            .map(|d| d.join("rsa"))
            .unwrap_or_else(|| PathBuf::from("./rsa_data"))
    } else {
        // ~/.local/share/rsa, %LOCALAPPDATA%\rsa
        dirs::data_local_dir()
            .map(|d| d.join("rsa"))
            .unwrap_or_else(|| PathBuf::from("./rsa_data"))
    }
}

/// Path of the per-module TOML config file, if a config directory exists
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rsa").join(format!("{}.toml", module_name)))
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Dataset file path or `http(s)://` URL
    #[serde(default)]
    pub dataset: Option<String>,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sentiment model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    #[serde(default = "default_inference_url")]
    pub inference_url: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            hub_url: default_hub_url(),
            inference_url: default_inference_url(),
        }
    }
}

/// Interaction log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_log_endpoint(),
            enabled: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_hub_url() -> String {
    DEFAULT_HUB_URL.to_string()
}

fn default_inference_url() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}

fn default_log_endpoint() -> String {
    DEFAULT_LOG_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load the module's TOML config without logging
    ///
    /// **Returns:** Ok(None) if there is no config file, Err if it is malformed.
    /// Used by binaries that read the log level before tracing is set up.
    pub fn try_load(module_name: &str) -> Result<Option<(Self, PathBuf)>> {
        let Some(path) = config_file_path(module_name) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let config = Self::from_path(&path)?;
        Ok(Some((config, path)))
    }

    /// Effective dataset location
    pub fn dataset_or_default(&self) -> String {
        self.dataset
            .clone()
            .unwrap_or_else(|| DEFAULT_DATASET.to_string())
    }

    /// Effective HTTP port
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Resolves the service root folder
///
/// Priority: explicit override → `RSA_ROOT_FOLDER` → `RSA_ROOT` → TOML
/// `root_folder` → compiled default.
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
        }
    }

    /// Command-line value, takes precedence over everything else
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        if let Ok(path) = std::env::var("RSA_ROOT_FOLDER") {
            return PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("RSA_ROOT") {
            return PathBuf::from(path);
        }

        if let Some(path) = config_file_path(&self.module_name) {
            if path.exists() {
                match TomlConfig::from_path(&path) {
                    Ok(config) => {
                        if let Some(root) = config.root_folder {
                            return root;
                        }
                    }
                    Err(e) => warn!("Config file {} unusable: {}", path.display(), e),
                }
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing. Idempotent.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
