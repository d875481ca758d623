//! Configuration module for dropsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Command-line arguments are applied on top of the loaded file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for dropsync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub transfer: TransferConfig,
    pub liveness: LivenessConfig,
    pub logging: LoggingConfig,
    pub lock: LockConfig,
}

/// What to synchronize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote folder, relative to the store root. `/` is the root itself.
    pub remote_folder: String,
    /// Local directory; a leading `~` is expanded at runtime.
    pub local_folder: PathBuf,
    /// Whether dotfiles and dot-directories take part in the upload pass.
    pub include_hidden: bool,
}

/// Transfer protocol settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Files above this size (in MiB) are uploaded through a session.
    pub large_file_threshold_mb: u64,
    /// Size of each session chunk (in MiB).
    pub chunk_size_mb: u64,
    /// Timeout for a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

/// How often the engine logs that it is still alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Loop iterations between runtime lines in the upload pass.
    pub upload_loop_interval: u64,
    /// Loop iterations between runtime lines in the download pass.
    pub download_loop_interval: u64,
    /// Successful transfers between runtime lines.
    pub transfer_interval: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Directory receiving one timestamped log file per run.
    pub directory: PathBuf,
    /// Write the log file as JSON lines.
    pub json: bool,
}

/// Process lock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Directory holding one lock file per local root.
    pub directory: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/dropsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("dropsync")
            .join("config.yaml")
    }
}

impl TransferConfig {
    pub fn threshold_bytes(&self) -> u64 {
        self.large_file_threshold_mb * MIB
    }

    pub fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_mb * MIB
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("dropsync")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_folder: "Downloads".to_string(),
            local_folder: PathBuf::from("~/Downloads"),
            include_hidden: false,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_mb: 10,
            chunk_size_mb: 4,
            request_timeout_secs: 120,
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            upload_loop_interval: 3000,
            download_loop_interval: 1000,
            transfer_interval: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: data_dir().join("log"),
            json: false,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            directory: data_dir().join("lock"),
        }
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.chunk_size_mb"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. The local folder
    /// is checked at startup, not here, because it may still contain `~`.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: u64| {
            if value == 0 {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must be greater than 0".into(),
                });
            }
        };

        // --- transfer ---
        positive(
            "transfer.large_file_threshold_mb",
            self.transfer.large_file_threshold_mb,
        );
        positive("transfer.chunk_size_mb", self.transfer.chunk_size_mb);
        positive(
            "transfer.request_timeout_secs",
            self.transfer.request_timeout_secs,
        );

        // --- liveness ---
        positive(
            "liveness.upload_loop_interval",
            self.liveness.upload_loop_interval,
        );
        positive(
            "liveness.download_loop_interval",
            self.liveness.download_loop_interval,
        );
        positive("liveness.transfer_interval", self.liveness.transfer_interval);

        if self.transfer.chunk_size_mb > self.transfer.large_file_threshold_mb {
            errors.push(ValidationError {
                field: "transfer.chunk_size_mb".into(),
                message: format!(
                    "chunk size ({} MiB) must not exceed the large file threshold ({} MiB)",
                    self.transfer.chunk_size_mb, self.transfer.large_file_threshold_mb
                ),
            });
        }

        // --- sync ---
        if self.sync.local_folder.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.local_folder".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid log level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`], starting from defaults.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pre-filled with [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- sync ---

    pub fn remote_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.sync.remote_folder = folder.into();
        self
    }

    pub fn local_folder(mut self, folder: PathBuf) -> Self {
        self.config.sync.local_folder = folder;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.sync.include_hidden = include;
        self
    }

    // --- transfer ---

    pub fn large_file_threshold_mb(mut self, mb: u64) -> Self {
        self.config.transfer.large_file_threshold_mb = mb;
        self
    }

    pub fn chunk_size_mb(mut self, mb: u64) -> Self {
        self.config.transfer.chunk_size_mb = mb;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.transfer.request_timeout_secs = secs;
        self
    }

    // --- logging / lock ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_directory(mut self, dir: PathBuf) -> Self {
        self.config.logging.directory = dir;
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    pub fn lock_directory(mut self, dir: PathBuf) -> Self {
        self.config.lock.directory = dir;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
