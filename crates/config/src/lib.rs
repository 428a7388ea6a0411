//! Driftlog Configuration
//!
//! TOML-based configuration loading with sensible defaults. The only
//! required field is the sink path — a minimal config is:
//!
//! ```toml
//! [sink]
//! path = "logs/driftlog.log"
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [store]
//! host = "localhost"
//! port = 5984
//! db_name = "logging"
//! https = false
//!
//! [store.admin]
//! username = "admin"
//! password = "secret"
//!
//! [store.logging_user]
//! username = "logger"
//! password = "secret"
//!
//! [sink]
//! path = "logs/driftlog.log"
//! roll_after_bytes = 52428800
//!
//! [source]
//! queue_size = 1024
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod error;
mod logging;
mod sink;
mod source;
mod store;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sink::SinkConfig;
pub use source::SourceConfig;
pub use store::{Credentials, StoreConfig};

/// Main configuration structure
///
/// All sections are optional with sensible defaults except the sink path,
/// which validation requires.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream store coordinates and credentials
    pub store: StoreConfig,

    /// Rolling file sink settings
    pub sink: SinkConfig,

    /// Live subscription settings
    pub source: SourceConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        contents.parse()
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.sink.path.is_empty() {
            return Err(ConfigError::missing_field("sink", "path"));
        }
        if self.sink.roll_after_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "sink",
                "roll_after_bytes",
                "must be greater than zero",
            ));
        }
        if self.store.db_name.is_empty() {
            return Err(ConfigError::missing_field("store", "db_name"));
        }
        if self.store.port == 0 {
            return Err(ConfigError::invalid_value(
                "store",
                "port",
                "must be a valid TCP port",
            ));
        }
        if self.source.queue_size == 0 {
            return Err(ConfigError::invalid_value(
                "source",
                "queue_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
