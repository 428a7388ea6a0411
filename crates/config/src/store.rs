//! Upstream store configuration

use std::fmt;

use serde::Deserialize;

/// Username and password for a store account
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Credentials {
    /// Account name
    pub username: String,

    /// Account password
    pub password: String,
}

// Manual Debug so passwords never land in diagnostics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upstream store coordinates and credentials
///
/// # Example
///
/// ```toml
/// [store]
/// host = "localhost"
/// port = 5984
/// db_name = "logging"
/// https = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Store hostname
    pub host: String,

    /// Store TCP port
    pub port: u16,

    /// Database holding the pending log records
    pub db_name: String,

    /// Connect over HTTPS
    pub https: bool,

    /// Admin account used only for startup provisioning
    pub admin: Credentials,

    /// Account the drain runs as
    pub logging_user: Credentials,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5984,
            db_name: "logging".into(),
            https: false,
            admin: Credentials::default(),
            logging_user: Credentials::default(),
        }
    }
}

impl StoreConfig {
    /// Base URL of the store
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}
