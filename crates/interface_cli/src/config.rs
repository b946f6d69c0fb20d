//! CLI configuration

use serde::Deserialize;

use infra_erp::ErpClientConfig;

use crate::error::CliError;

/// Environment prefix for every setting
pub const ENV_PREFIX: &str = "ERP";

/// Settings read from `ERP_*` variables
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// ERP server base URL
    pub base_url: String,
    /// ERP login
    pub login: String,
    /// Plain password
    pub password: Option<String>,
    /// SHA-1 hex digest of the password
    pub password_sha1: Option<String>,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Exponential backoff base
    pub backoff_factor: f64,
    /// Log level
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        let client = ErpClientConfig::default();
        Self {
            base_url: client.base_url,
            login: client.login,
            password: None,
            password_sha1: None,
            verify_ssl: client.verify_ssl,
            timeout_secs: client.timeout_secs,
            max_retries: client.max_retries,
            backoff_factor: client.backoff_factor,
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("client", &self.client_config())
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl CliConfig {
    /// Loads configuration from the environment
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from any `config` source
    pub fn from_source<S>(source: S) -> Result<Self, CliError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Client settings; token lifetime stays at its default
    pub fn client_config(&self) -> ErpClientConfig {
        ErpClientConfig {
            base_url: self.base_url.clone(),
            login: self.login.clone(),
            password: self.password.clone(),
            password_sha1: self.password_sha1.clone(),
            verify_ssl: self.verify_ssl,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            backoff_factor: self.backoff_factor,
            ..ErpClientConfig::default()
        }
    }
}
