//! Command-line Interface
//!
//! Loads client settings from the environment and turns JSON invoice
//! drafts into validated invoices for the `erp-invoice` binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_cli::{CliConfig, InvoiceDraft};
//!
//! let config = CliConfig::from_env()?;
//! let invoice = InvoiceDraft::load("draft.json")?.into_invoice()?;
//! ```

pub mod config;
pub mod draft;
pub mod error;

pub use config::CliConfig;
pub use draft::{InvoiceDraft, ItemDraft};
pub use error::CliError;
