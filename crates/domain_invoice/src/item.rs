//! Invoice line items
//!
//! A line carries an already-resolved product reference together with the
//! quantity, unit price and line total as printed on the supplier's
//! document. The total is kept as given (it is what the ERP books) but must
//! agree with `amount × price` to within one cent.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use core_kernel::{ProductRef, StoreRef};

use crate::error::InvoiceError;

/// Maximum accepted difference between `sum` and `amount × price`
pub const SUM_TOLERANCE: Decimal = dec!(0.01);

/// A validated line of an incoming invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    num: u32,
    product: ProductRef,
    amount: Decimal,
    price: Decimal,
    sum: Decimal,
    store: Option<StoreRef>,
}

impl InvoiceItem {
    /// Creates a line item, validating quantity, price and the line total
    ///
    /// # Arguments
    ///
    /// * `num` - 1-based line number
    /// * `product` - ERP product reference
    /// * `amount` - Quantity, strictly positive
    /// * `price` - Unit price, zero or positive
    /// * `sum` - Line total as printed on the document, zero or positive
    ///
    /// # Errors
    ///
    /// Returns an `InvoiceError` if any of the above constraints is violated
    /// or `|sum - amount * price| > 0.01`.
    pub fn new(
        num: u32,
        product: impl Into<String>,
        amount: Decimal,
        price: Decimal,
        sum: Decimal,
    ) -> Result<Self, InvoiceError> {
        if num == 0 {
            return Err(InvoiceError::InvalidLineNumber(num));
        }

        let product = ProductRef::new(product)?;

        if amount <= Decimal::ZERO {
            return Err(InvoiceError::NonPositiveAmount { num, amount });
        }

        if price < Decimal::ZERO {
            return Err(InvoiceError::NegativePrice { num, price });
        }

        if sum < Decimal::ZERO {
            return Err(InvoiceError::NegativeSum { num, sum });
        }

        let expected = amount
            .checked_mul(price)
            .ok_or(InvoiceError::ArithmeticOverflow { num })?;
        let diff = sum
            .checked_sub(expected)
            .ok_or(InvoiceError::ArithmeticOverflow { num })?
            .abs();
        if diff > SUM_TOLERANCE {
            return Err(InvoiceError::SumMismatch {
                num,
                sum,
                amount,
                price,
                expected,
                diff,
            });
        }

        Ok(Self {
            num,
            product,
            amount,
            price,
            sum,
            store: None,
        })
    }

    /// Overrides the invoice's default store for this line
    pub fn with_store(mut self, store: impl Into<String>) -> Result<Self, InvoiceError> {
        self.store = Some(StoreRef::new(store)?);
        Ok(self)
    }

    /// 1-based line number
    pub fn num(&self) -> u32 {
        self.num
    }

    /// ERP product reference
    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    /// Quantity
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Unit price
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Line total
    pub fn sum(&self) -> Decimal {
        self.sum
    }

    /// Store override, if this line is booked to a non-default store
    pub fn store(&self) -> Option<&StoreRef> {
        self.store.as_ref()
    }
}
