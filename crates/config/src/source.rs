//! Live subscription configuration

use serde::Deserialize;

/// Default capacity of the live subscription channel
const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Live subscription settings
///
/// # Example
///
/// ```toml
/// [source]
/// queue_size = 1024
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    /// Capacity of the channel between the change feed and the pipeline;
    /// the feed waits for capacity, so this bounds memory, not delivery
    pub queue_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}
