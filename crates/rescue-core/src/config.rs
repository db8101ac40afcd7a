//! Configuration loading and typed config structures for the replay viewer.
//!
//! The canonical configuration lives in `rescue-config.yaml` next to the
//! binary's working directory. This module defines strongly-typed structs
//! that mirror the YAML structure, and provides a loader that reads and
//! validates the file. Every field has a default, so an empty or missing
//! file yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides `source.path`.
pub const SOURCE_ENV_VAR: &str = "RESCUE_SOURCE";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level replay viewer configuration.
///
/// Mirrors the structure of `rescue-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayConfig {
    /// Snapshot policy for the timeline.
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Playback driver settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Where ingestion events are read from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Observer HTTP server settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `RESCUE_SOURCE` overrides `source.path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// default configuration instead of an error.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) for files that exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.source.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.source.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeline.snapshot_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "timeline.snapshot_interval",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.playback.round_interval_ms < MIN_ROUND_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                field: "playback.round_interval_ms",
                reason: format!("must be at least {MIN_ROUND_INTERVAL_MS}"),
            });
        }
        Ok(())
    }
}

/// Smallest accepted playback interval in milliseconds.
pub const MIN_ROUND_INTERVAL_MS: u64 = 10;

/// Timeline snapshot policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimelineConfig {
    /// Take a snapshot every N rounds.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u32,

    /// Whether seeks may start from interval snapshots and reuse the live
    /// round. When `false`, every seek replays from round 1.
    #[serde(default = "default_true")]
    pub lazy_snapshots: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: default_snapshot_interval(),
            lazy_snapshots: true,
        }
    }
}

/// Playback driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlaybackConfig {
    /// Real-time milliseconds between auto-advanced rounds.
    #[serde(default = "default_round_interval_ms")]
    pub round_interval_ms: u64,

    /// Start playing as soon as the first round arrives, and resume when
    /// new rounds arrive after playback caught up with the feed.
    #[serde(default)]
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            round_interval_ms: default_round_interval_ms(),
            autoplay: false,
        }
    }
}

/// Ingestion source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// JSON-lines file to read events from. `None` or `-` means stdin.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Delay between consecutive lines, to mimic a live feed. 0 = no delay.
    #[serde(default)]
    pub line_delay_ms: u64,
}

impl SourceConfig {
    /// Override the source path from `RESCUE_SOURCE` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SOURCE_ENV_VAR) {
            self.path = Some(PathBuf::from(val));
        }
    }

    /// Whether events should be read from stdin.
    pub fn is_stdin(&self) -> bool {
        self.path
            .as_deref()
            .is_none_or(|p| p.as_os_str() == "-")
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to run the observer server at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_snapshot_interval() -> u32 {
    10
}

const fn default_round_interval_ms() -> u64 {
    200
}

fn default_observer_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
