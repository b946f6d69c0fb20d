//! ERP Integration Layer
//!
//! Submits incoming invoices to the ERP's XML import API and reads its
//! supplier directory.
//!
//! # Architecture
//!
//! ```text
//! ErpClient ──► codec::encode ──► RetryExecutor ──► HttpTransport
//!     │                              │
//!     └──────── TokenProvider ◄──────┘ (re-auth on 401)
//! ```
//!
//! - `transport`: the HTTP seam; `ReqwestTransport` in production
//! - `auth`: cached session token with single-flight refresh
//! - `retry`: backoff on 502/503/504 and transport timeouts
//! - `codec`: request and response documents
//! - `client`: the facade; `blocking` wraps it for synchronous callers
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ErpClientConfig::new("https://erp.example.com:443", "api")
//!     .with_password_sha1(hash);
//! let client = ErpClient::from_config(&config)?;
//! let receipt = client.submit_invoice(&invoice).await?;
//! client.close().await;
//! ```

pub mod auth;
pub mod blocking;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod observer;
pub mod retry;
pub mod transport;

pub use auth::{AuthSession, TokenProvider};
pub use blocking::BlockingErpClient;
pub use client::{ErpClient, SubmissionReceipt, SubmissionState};
pub use codec::{CodecError, ImportResponse};
pub use config::{Credentials, ErpClientConfig};
pub use error::{ErpError, ErrorKind, TransportError};
pub use observer::{OutcomeObserver, SubmissionStats};
pub use retry::{RetryExecutor, RetryPolicy};
pub use transport::{ErpRequest, ErpResponse, HttpTransport, ReqwestTransport};
