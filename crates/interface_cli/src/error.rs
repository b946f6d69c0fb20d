//! CLI error handling

use thiserror::Error;

use domain_invoice::InvoiceError;
use infra_erp::ErpError;

/// Errors raised before or around a client call
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid invoice draft: {0}")]
    Draft(#[from] serde_json::Error),

    #[error("Invalid invoice: {0}")]
    Invoice(#[from] InvoiceError),

    #[error(transparent)]
    Erp(#[from] ErpError),
}
