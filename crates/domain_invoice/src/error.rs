//! Invoice domain errors

use chrono::NaiveDate;
use core_kernel::CoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while constructing an invoice or one of its lines
///
/// Every variant is a validation failure: a malformed invoice never
/// reaches the network layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvoiceError {
    /// Invoice has no lines
    #[error("Invoice must contain at least one item")]
    EmptyInvoice,

    /// A reference identifier was blank
    #[error(transparent)]
    InvalidReference(#[from] CoreError),

    /// Line number is zero
    #[error("Item line numbers are 1-based, got {0}")]
    InvalidLineNumber(u32),

    /// Two lines share a number
    #[error("Duplicate item line number: {0}")]
    DuplicateLineNumber(u32),

    /// Quantity is zero or negative
    #[error("Item {num}: amount must be positive, got {amount}")]
    NonPositiveAmount { num: u32, amount: Decimal },

    /// Unit price is negative
    #[error("Item {num}: price cannot be negative, got {price}")]
    NegativePrice { num: u32, price: Decimal },

    /// Line total is negative
    #[error("Item {num}: sum cannot be negative, got {sum}")]
    NegativeSum { num: u32, sum: Decimal },

    /// Line sum disagrees with amount × price beyond tolerance
    #[error("Item {num}: sum ({sum}) does not match price*amount ({price}*{amount}={expected}), diff={diff}")]
    SumMismatch {
        num: u32,
        sum: Decimal,
        amount: Decimal,
        price: Decimal,
        expected: Decimal,
        diff: Decimal,
    },

    /// Incoming date is later than tomorrow
    #[error("date_incoming ({date}) cannot be later than {max_date}")]
    FutureDate { date: NaiveDate, max_date: NaiveDate },

    /// amount × price does not fit in a decimal
    #[error("Item {num}: amount*price overflows")]
    ArithmeticOverflow { num: u32 },
}

impl InvoiceError {
    /// Line number the error refers to, if any
    pub fn line(&self) -> Option<u32> {
        match self {
            InvoiceError::InvalidLineNumber(num) | InvoiceError::DuplicateLineNumber(num) => Some(*num),
            InvoiceError::NonPositiveAmount { num, .. }
            | InvoiceError::NegativePrice { num, .. }
            | InvoiceError::NegativeSum { num, .. }
            | InvoiceError::SumMismatch { num, .. }
            | InvoiceError::ArithmeticOverflow { num } => Some(*num),
            InvoiceError::EmptyInvoice
            | InvoiceError::InvalidReference(_)
            | InvoiceError::FutureDate { .. } => None,
        }
    }
}
