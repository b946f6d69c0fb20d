//! Incoming Invoice Domain
//!
//! This crate models the incoming (supplier) invoice exactly as the ERP
//! import endpoint expects it. All product, supplier and store references
//! are already resolved to ERP identifiers by the time an invoice is built.
//!
//! # Invariants
//!
//! - An invoice has at least one line
//! - Line numbers are 1-based and unique
//! - Each line has a positive amount, a non-negative price and a sum within
//!   0.01 of `amount × price`
//! - Once built, an invoice never changes
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_invoice::{Invoice, InvoiceItem};
//!
//! let invoice = Invoice::builder(supplier_id, store_id)
//!     .item(InvoiceItem::new(1, product_id, dec!(5), dec!(10.50), dec!(52.50))?)
//!     .build()?;
//! ```

pub mod invoice;
pub mod item;
pub mod supplier;
pub mod error;

pub use invoice::{Invoice, InvoiceBuilder, generate_document_number};
pub use item::{InvoiceItem, SUM_TOLERANCE};
pub use supplier::SupplierRecord;
pub use error::InvoiceError;
