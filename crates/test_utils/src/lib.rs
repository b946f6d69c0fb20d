//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! invoice client test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built invoices and ERP response bodies
//! - `builders`: Builder patterns for test invoice construction
//! - `assertions`: Custom assertion helpers for invoices and XML payloads
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
