//! One-time store provisioning
//!
//! Creates the logging database and the logging user and grants the user
//! database membership, using admin credentials. Safe to run on every
//! startup: already-exists responses count as success.

use reqwest::{StatusCode, Url};
use serde_json::json;

use crate::error::{Result, SourceError};

use super::{build_client, parse_base_url, status_error, CouchConfig, REQUEST_TIMEOUT};

/// Startup provisioning against the store's admin API
pub struct Provisioner {
    client: reqwest::Client,
    base: Url,
    db_name: String,
    admin_username: String,
    admin_password: String,
}

impl Provisioner {
    /// Create a provisioner for the store named by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client creation
    /// fails.
    pub fn new(
        config: &CouchConfig,
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base: parse_base_url(&config.base_url)?,
            db_name: config.db_name.clone(),
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
        })
    }

    /// Ensure database, user, and membership exist
    pub async fn provision(&self, username: &str, password: &str) -> Result<()> {
        self.ensure_database().await?;
        self.ensure_user(username, password).await?;
        self.grant_membership(username).await?;
        Ok(())
    }

    /// `PUT /{db}` — 412 means the database already exists
    async fn ensure_database(&self) -> Result<()> {
        let response = self
            .client
            .put(self.url(&[self.db_name.as_str()]))
            .basic_auth(&self.admin_username, Some(&self.admin_password))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(db = %self.db_name, "created logging database");
                Ok(())
            }
            StatusCode::PRECONDITION_FAILED => {
                tracing::debug!(db = %self.db_name, "logging database already exists");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::AuthFailed(
                "admin credentials rejected creating database".into(),
            )),
            status => Err(status_error(status, "create database")),
        }
    }

    /// `PUT /_users/org.couchdb.user:{name}` — 409 means the user exists
    async fn ensure_user(&self, username: &str, password: &str) -> Result<()> {
        let user_id = format!("org.couchdb.user:{}", username);
        let response = self
            .client
            .put(self.url(&["_users", user_id.as_str()]))
            .basic_auth(&self.admin_username, Some(&self.admin_password))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({
                "name": username,
                "password": password,
                "roles": [],
                "type": "user",
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(user = %username, "created logging user");
                Ok(())
            }
            StatusCode::CONFLICT => {
                tracing::debug!(user = %username, "logging user already exists");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::AuthFailed(
                "admin credentials rejected creating user".into(),
            )),
            status => Err(status_error(status, "create user")),
        }
    }

    /// `PUT /{db}/_security` — grant the logging user database membership
    async fn grant_membership(&self, username: &str) -> Result<()> {
        let response = self
            .client
            .put(self.url(&[self.db_name.as_str(), "_security"]))
            .basic_auth(&self.admin_username, Some(&self.admin_password))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({
                "members": { "names": [username], "roles": [] },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), "set database security"));
        }
        tracing::debug!(db = %self.db_name, user = %username, "granted database membership");
        Ok(())
    }

    /// URL for a path under the store root
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .expect("base URL validated at construction");
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }
}
