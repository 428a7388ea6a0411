//! Rolling file sink configuration

use serde::Deserialize;

/// Default rotation threshold (50 MiB)
const DEFAULT_ROLL_AFTER_BYTES: u64 = 50 * 1024 * 1024;

/// Rolling file sink settings
///
/// # Example
///
/// ```toml
/// [sink]
/// path = "logs/driftlog.log"
/// roll_after_bytes = 52428800
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SinkConfig {
    /// Active log file path (required)
    pub path: String,

    /// Rotate once the active file has reached this many bytes
    /// Default: 50 MiB
    pub roll_after_bytes: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            roll_after_bytes: DEFAULT_ROLL_AFTER_BYTES,
        }
    }
}
