//! Configuration loading and types for voxtap
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/voxtap/config.toml)
//! 3. Environment variables (VOXTAP_*)
//! 4. CLI arguments (highest priority)

use crate::error::VoxtapError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Voxtap Configuration
#
# Location: ~/.config/voxtap/config.toml
# All settings can be overridden via CLI flags

[gesture]
# How taps reach the screen:
#   "ydotool" - pointer move + left button via ydotoold (default)
#   "dry_run" - log taps without touching the screen
backend = "ydotool"

# How long each press is held (ms)
tap_duration_ms = 60

# Spacing between markers when clicking all of them (ms)
inter_point_delay_ms = 120

# Spacing between markers when double clicking all of them (ms)
inter_point_group_delay_ms = 220

# Spacing between the two presses of a double click (ms)
double_tap_gap_ms = 110

[recognition]
# Pause before listening again after a command was handled (ms)
restart_delay_ms = 400

# Pause before retrying after a recognizer error (ms)
error_retry_ms = 800

# Pause before retrying when the recognizer is unavailable (ms)
unavailable_retry_ms = 5000

[storage]
# Where markers and display settings are kept:
#   "auto"   - ~/.local/share/voxtap/markers.json
#   "memory" - nothing is written, markers are lost on exit
#   any other value is used as a file path
path = "auto"

[feedback]
# Show a desktop notification for each handled command
notify = false

# Include the recognized text in notifications
echo_heard = true

[logging]
# Also write logs to a daily file (voxtap.YYYY-MM-DD.log)
file = false

# Log directory: "auto" (~/.local/share/voxtap/logs) or a path
dir = "auto"
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,

    #[serde(default)]
    pub recognition: RecognitionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tap execution backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureBackend {
    #[default]
    Ydotool,
    DryRun,
}

impl std::fmt::Display for GestureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureBackend::Ydotool => write!(f, "ydotool"),
            GestureBackend::DryRun => write!(f, "dry_run"),
        }
    }
}

impl std::str::FromStr for GestureBackend {
    type Err = VoxtapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ydotool" => Ok(GestureBackend::Ydotool),
            "dry_run" | "dryrun" | "none" => Ok(GestureBackend::DryRun),
            other => Err(VoxtapError::Config(format!(
                "Unknown gesture backend '{}'. Use ydotool or dry_run.",
                other
            ))),
        }
    }
}

/// Gesture timing and backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub backend: GestureBackend,

    #[serde(default = "default_tap_duration")]
    pub tap_duration_ms: u64,

    #[serde(default = "default_inter_point_delay")]
    pub inter_point_delay_ms: u64,

    #[serde(default = "default_inter_point_group_delay")]
    pub inter_point_group_delay_ms: u64,

    #[serde(default = "default_double_tap_gap")]
    pub double_tap_gap_ms: u64,
}

fn default_tap_duration() -> u64 {
    60
}

fn default_inter_point_delay() -> u64 {
    120
}

fn default_inter_point_group_delay() -> u64 {
    220
}

fn default_double_tap_gap() -> u64 {
    110
}

/// Upper bound for any single gesture delay or press duration
pub const MAX_GESTURE_MS: u64 = 10_000;

impl GestureConfig {
    /// Reject timings that could not be scheduled
    pub fn validate(&self) -> Result<(), VoxtapError> {
        let timings = [
            ("tap_duration_ms", self.tap_duration_ms),
            ("inter_point_delay_ms", self.inter_point_delay_ms),
            ("inter_point_group_delay_ms", self.inter_point_group_delay_ms),
            ("double_tap_gap_ms", self.double_tap_gap_ms),
        ];

        for (key, value) in timings {
            if value > MAX_GESTURE_MS {
                return Err(VoxtapError::Config(format!(
                    "gesture.{} = {} is above the {}ms limit",
                    key, value, MAX_GESTURE_MS
                )));
            }
        }
        Ok(())
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            backend: GestureBackend::default(),
            tap_duration_ms: default_tap_duration(),
            inter_point_delay_ms: default_inter_point_delay(),
            inter_point_group_delay_ms: default_inter_point_group_delay(),
            double_tap_gap_ms: default_double_tap_gap(),
        }
    }
}

/// Recognition loop restart delays
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,

    #[serde(default = "default_error_retry")]
    pub error_retry_ms: u64,

    #[serde(default = "default_unavailable_retry")]
    pub unavailable_retry_ms: u64,
}

fn default_restart_delay() -> u64 {
    400
}

fn default_error_retry() -> u64 {
    800
}

fn default_unavailable_retry() -> u64 {
    5000
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: default_restart_delay(),
            error_retry_ms: default_error_retry(),
            unavailable_retry_ms: default_unavailable_retry(),
        }
    }
}

/// Marker persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// "auto", "memory", or a file path
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "auto".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StorageConfig {
    /// Resolve the store file path.
    /// Returns None for an in-memory store.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        match self.path.to_lowercase().as_str() {
            "memory" | "none" | "off" => None,
            "auto" | "" => Some(Config::data_dir().join("markers.json")),
            _ => Some(PathBuf::from(&self.path)),
        }
    }
}

/// User feedback for handled commands
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    #[serde(default)]
    pub notify: bool,

    #[serde(default = "default_true")]
    pub echo_heard: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            notify: false,
            echo_heard: true,
        }
    }
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Write logs to a daily rolling file in addition to the terminal
    #[serde(default)]
    pub file: bool,

    /// "auto" or a directory path
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_dir() -> String {
    "auto".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            dir: default_log_dir(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the directory log files are written to
    pub fn resolve_dir(&self) -> PathBuf {
        match self.dir.to_lowercase().as_str() {
            "auto" | "" => Config::data_dir().join("logs"),
            _ => PathBuf::from(&self.dir),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voxtap")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path (for the marker store)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "voxtap")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Apply VOXTAP_* overrides using the given variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), VoxtapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("VOXTAP_GESTURE_BACKEND") {
            self.gesture.backend = backend.parse()?;
        }
        if let Some(path) = lookup("VOXTAP_STORE") {
            self.storage.path = path;
        }
        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, VoxtapError> {
    // Start with defaults
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| VoxtapError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| VoxtapError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    config.apply_env(|key| std::env::var(key).ok())?;
    config.gesture.validate()?;

    Ok(config)
}

/// Write the commented default config file. An existing file is kept
/// unless `force` is set; returns whether the file was written.
pub fn write_default_config(path: &Path, force: bool) -> Result<bool, VoxtapError> {
    if path.exists() && !force {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;

    tracing::debug!("Wrote default config to {:?}", path);
    Ok(true)
}
