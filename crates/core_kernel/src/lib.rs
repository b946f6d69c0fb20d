//! Core Kernel - Foundational types shared by the invoice submission crates
//!
//! This crate provides the fundamental building blocks used across the workspace:
//! - Opaque ERP reference identifiers (product, supplier, store, conception)
//! - The shared validation/configuration error type

pub mod identifiers;
pub mod error;

pub use identifiers::{ProductRef, SupplierRef, StoreRef, ConceptionRef};
pub use error::CoreError;
