//! Configuration and logging setup for Strata.
//!
//! Configuration is read from TOML:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//!
//! [aliases]
//! background_refresh = true
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level Strata configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub aliases: AliasConfig,
}

impl StrataConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Controls how the alias engine reacts to changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    /// When disabled every alias query reports "no aliases". Lifecycle
    /// notifications are still recorded.
    #[serde(default = "AliasConfig::default_enabled")]
    pub enabled: bool,

    /// Ask the resource model to refresh aliases in the background instead of
    /// inline with the triggering operation.
    #[serde(default)]
    pub background_refresh: bool,

    /// Remove aliased projects from the workspace tree when their backing
    /// directory has disappeared from disk, instead of refreshing them.
    #[serde(default = "AliasConfig::default_delete_missing_projects")]
    pub delete_missing_projects: bool,
}

impl AliasConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_delete_missing_projects() -> bool {
        true
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            background_refresh: false,
            delete_missing_projects: Self::default_delete_missing_projects(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all Strata crates.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Mirror logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path. If the file cannot be opened, file
    /// logging is disabled while other sinks remain active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            // Simple levels should be forgiving about casing and synonyms.
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter` for Strata tracing.
    ///
    /// `level` may be either a simple level (`info`, `debug`, ...) or a full
    /// `EnvFilter` directive string. If `RUST_LOG` is set, it is merged in.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Initializes structured `tracing` logging.
///
/// Safe to call multiple times; only the first call installs a global
/// subscriber, and an already-installed subscriber is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let stderr = config.stderr.then(|| {
            // `cargo test` only captures output written through the stdlib's print macros.
            if cfg!(debug_assertions) {
                BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
            } else {
                BoxMakeWriter::new(io::stderr)
            }
        });
        let file = config.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
                .map(Mutex::new)
        });

        let make_writer = match (stderr, file) {
            (Some(stderr), Some(file)) => BoxMakeWriter::new(stderr.and(file)),
            (Some(stderr), None) => stderr,
            (None, Some(file)) => BoxMakeWriter::new(file),
            (None, None) => BoxMakeWriter::new(io::sink),
        };

        let filter = config.env_filter();
        let layer = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .with_filter(filter)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                target: "strata.config",
                "a global tracing subscriber is already installed"
            );
        }
    });
}
