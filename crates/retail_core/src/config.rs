//! Runtime configuration for the store handle and logging.
//!
//! # Responsibility
//! - Describe where the document store lives and how long writers may wait.
//! - Load settings from `RETAIL_*` environment variables for binaries.
//!
//! # Invariants
//! - Malformed environment values are reported, never replaced by defaults.
//! - Configuration is plain data; nothing here opens connections.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "RETAIL_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "RETAIL_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "RETAIL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "RETAIL_LOG_DIR";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error raised while reading configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                variable,
                value,
                reason,
            } => write!(f, "invalid value `{value}` for {variable}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Physical location of the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite database file shared by every connection opened on it.
    File(PathBuf),
    /// Private in-memory database, visible to one connection only.
    Memory,
}

impl StoreLocation {
    /// Short label used in log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Store handle settings passed explicitly to the bootstrap code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Upper bound for waiting on another writer's lock.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// File-backed store with the default busy timeout.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Full configuration consumed by binaries embedding the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub store: StoreConfig,
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.store.location = StoreLocation::File(PathBuf::from(path));
        }

        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    variable: ENV_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: "expected a whole number of milliseconds",
                })?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    variable: ENV_BUSY_TIMEOUT_MS,
                    value: raw,
                    reason: "timeout must be greater than zero",
                });
            }
            config.store.busy_timeout = Duration::from_millis(millis);
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    variable: ENV_LOG_DIR,
                    value: dir.display().to_string(),
                    reason: "log directory must be an absolute path",
                });
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }
}
