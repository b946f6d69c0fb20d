//! Client configuration and credentials

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::error::ErpError;
use crate::retry::RetryPolicy;

/// Connection, credential and resilience settings for the ERP client
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ErpClientConfig {
    /// Base URL of the ERP server, without trailing slash
    pub base_url: String,
    /// Login name
    pub login: String,
    /// Plain password, hashed before use
    pub password: Option<String>,
    /// Pre-computed lowercase hex SHA-1 of the password
    pub password_sha1: Option<String>,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base of the exponential backoff
    pub backoff_factor: f64,
    /// Nominal token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Tokens closer than this to expiry are refreshed
    pub token_refresh_threshold_secs: u64,
}

impl Default for ErpClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            login: String::new(),
            password: None,
            password_sha1: None,
            verify_ssl: true,
            timeout_secs: 30,
            max_retries: 3,
            backoff_factor: 2.0,
            token_ttl_secs: 25 * 60,
            token_refresh_threshold_secs: 5 * 60,
        }
    }
}

impl fmt::Debug for ErpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpClientConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("password_sha1", &self.password_sha1.as_ref().map(|_| "***"))
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("token_refresh_threshold_secs", &self.token_refresh_threshold_secs)
            .finish()
    }
}

impl ErpClientConfig {
    /// Creates a configuration with default resilience settings
    pub fn new(base_url: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login: login.into(),
            ..Default::default()
        }
    }

    /// Sets the plain password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the pre-hashed password
    pub fn with_password_sha1(mut self, hash: impl Into<String>) -> Self {
        self.password_sha1 = Some(hash.into());
        self
    }

    /// Base URL with any trailing slashes removed
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn token_refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.token_refresh_threshold_secs)
    }

    /// Retry policy derived from these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_factor)
    }

    /// Checks that a client can be built from these settings
    pub fn validate(&self) -> Result<(), ErpError> {
        if self.normalized_base_url().is_empty() {
            return Err(ErpError::Configuration("base URL is required".to_string()));
        }
        if self.login.trim().is_empty() {
            return Err(ErpError::Configuration("login is required".to_string()));
        }
        self.retry_policy().validate()?;
        if self.timeout_secs == 0 {
            return Err(ErpError::Configuration("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Login plus SHA-1 password digest sent to the auth endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password_sha1: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password_sha1: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password_sha1: password_sha1.into().trim().to_lowercase(),
        }
    }

    /// Hashes a plain password
    pub fn from_plain(login: impl Into<String>, password: &str) -> Self {
        Self::new(login, sha1_hex(password))
    }

    /// Resolves credentials, preferring the pre-computed hash
    pub fn from_config(config: &ErpClientConfig) -> Result<Self, ErpError> {
        let hashed = config
            .password_sha1
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty());

        match (hashed, config.password.as_deref()) {
            (Some(hash), _) => Ok(Self::new(config.login.trim(), hash)),
            (None, Some(password)) if !password.is_empty() => {
                Ok(Self::from_plain(config.login.trim(), password))
            }
            _ => Err(ErpError::Configuration(
                "either password or password_sha1 must be provided".to_string(),
            )),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password_sha1(&self) -> &str {
        &self.password_sha1
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password_sha1", &"***")
            .finish()
    }
}

/// Lowercase hex SHA-1 digest
pub fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}
