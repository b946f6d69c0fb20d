//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating invoices that satisfy the
//! domain invariants.

use chrono::NaiveDate;
use domain_invoice::{Invoice, InvoiceItem};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for positive quantities with up to 3 decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

/// Strategy for non-negative prices with 2 decimal places
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for ERP-style references
pub fn reference_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9-]{0,11}"
}

/// Strategy for incoming dates between 2000 and 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2025, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

/// Strategy for a valid invoice with 1 to `max_lines` lines
pub fn invoice_strategy(max_lines: usize) -> impl Strategy<Value = Invoice> {
    let lines = prop::collection::vec(
        (reference_strategy(), amount_strategy(), price_strategy()),
        1..=max_lines.max(1),
    );

    (
        lines,
        reference_strategy(),
        reference_strategy(),
        proptest::option::of(reference_strategy()),
        "[A-Z0-9-]{1,16}",
        date_strategy(),
    )
        .prop_filter_map(
            "invoice must be valid",
            |(lines, supplier, store, conception, number, date)| {
                let items = lines
                    .into_iter()
                    .zip(1u32..)
                    .map(|((product, amount, price), num)| {
                        InvoiceItem::new(num, product, amount, price, amount * price)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .ok()?;

                let mut builder = Invoice::builder(supplier, store)
                    .items(items)
                    .document_number(number)
                    .date_incoming(date);
                if let Some(conception) = conception {
                    builder = builder.conception(conception);
                }
                builder.build().ok()
            },
        )
}
