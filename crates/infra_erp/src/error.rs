//! Error taxonomy for ERP communication
//!
//! Every submission resolves to exactly one of these errors or to a
//! receipt. The mapping from transport conditions is:
//!
//! - Malformed domain object or ERP-rejected content -> `Validation`
//! - Token unobtainable, or 401 after the one-time re-authentication -> `Auth`
//! - Non-retryable status, or an unparsable response body -> `Http`
//! - Transient failures beyond the retry budget -> `RetryExhausted`
//! - Non-transient transport faults -> `Network`

use thiserror::Error;

use core_kernel::CoreError;
use domain_invoice::InvoiceError;

/// Low-level transport failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The transport was closed explicitly
    #[error("transport is closed")]
    Closed,

    /// Any other request failure (body, redirect, builder)
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Connect failures and timeouts are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Flat classification of an `ErpError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    Http,
    RetryExhausted,
    Network,
    Configuration,
}

/// Error returned by every ERP client operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErpError {
    /// Invoice rejected locally or by the ERP
    #[error("Validation error: {0}")]
    Validation(String),

    /// Token could not be obtained or was refused
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-retryable HTTP status or malformed response
    #[error("HTTP error{}: {message}", status_suffix(.status))]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// Transient failures exceeded the retry budget
    #[error("Retry attempts exhausted after {attempts} attempts: {cause}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        cause: Box<ErpError>,
    },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// Client cannot be built from the given settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" {}", code),
        None => String::new(),
    }
}

impl ErpError {
    /// Creates an HTTP error with a status code
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ErpError::Http {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates the error used when a response body cannot be parsed
    pub fn malformed_response(detail: impl std::fmt::Display) -> Self {
        ErpError::Http {
            status: None,
            message: format!("malformed response: {}", detail),
        }
    }

    /// Returns the flat classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErpError::Validation(_) => ErrorKind::Validation,
            ErpError::Auth(_) => ErrorKind::Auth,
            ErpError::Http { .. } => ErrorKind::Http,
            ErpError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            ErpError::Network(_) => ErrorKind::Network,
            ErpError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// HTTP status carried by this error or by its wrapped cause
    pub fn status(&self) -> Option<u16> {
        match self {
            ErpError::Http { status, .. } => *status,
            ErpError::RetryExhausted { cause, .. } => cause.status(),
            _ => None,
        }
    }

    /// Returns true if the failure is expected to resolve on retry
    pub fn is_transient(&self) -> bool {
        match self {
            ErpError::Http { status: Some(code), .. } => crate::retry::is_retryable_status(*code),
            ErpError::Network(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<InvoiceError> for ErpError {
    fn from(err: InvoiceError) -> Self {
        ErpError::Validation(err.to_string())
    }
}

impl From<CoreError> for ErpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ErpError::Validation(msg),
            CoreError::Configuration(msg) => ErpError::Configuration(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_display_with_and_without_status() {
        assert_eq!(ErpError::http(400, "bad").to_string(), "HTTP error 400: bad");
        assert_eq!(
            ErpError::malformed_response("eof").to_string(),
            "HTTP error: malformed response: eof"
        );
    }

    #[test]
    fn test_exhausted_exposes_cause() {
        let err = ErpError::RetryExhausted {
            attempts: 4,
            cause: Box::new(ErpError::http(502, "Bad Gateway")),
        };

        assert_eq!(err.kind(), ErrorKind::RetryExhausted);
        assert_eq!(err.status(), Some(502));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ErpError::http(503, "x").is_transient());
        assert!(!ErpError::http(400, "x").is_transient());
        assert!(ErpError::from(TransportError::Timeout("30s".into())).is_transient());
        assert!(!ErpError::from(TransportError::Closed).is_transient());
        assert!(!ErpError::Validation("x".into()).is_transient());
    }

    #[test]
    fn test_invoice_error_becomes_validation() {
        let err: ErpError = InvoiceError::EmptyInvoice.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("at least one item"));
    }
}
