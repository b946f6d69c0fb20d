//! Test Data Builders
//!
//! Builder patterns for constructing test invoices with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::NaiveDate;
use domain_invoice::{Invoice, InvoiceError, InvoiceItem};
use rust_decimal::Decimal;

use crate::fixtures::DateFixtures;

/// Builder for test invoices
pub struct TestInvoiceBuilder {
    supplier: String,
    store: String,
    conception: Option<String>,
    document_number: String,
    date_incoming: NaiveDate,
    external_id: Option<String>,
    lines: Vec<(String, Decimal, Decimal)>,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    /// Creates a builder with no lines and fixed header defaults
    pub fn new() -> Self {
        Self {
            supplier: "S1".to_string(),
            store: "ST1".to_string(),
            conception: None,
            document_number: "INV-TEST".to_string(),
            date_incoming: DateFixtures::incoming(),
            external_id: None,
            lines: Vec::new(),
        }
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = supplier.into();
        self
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = store.into();
        self
    }

    pub fn with_conception(mut self, conception: impl Into<String>) -> Self {
        self.conception = Some(conception.into());
        self
    }

    pub fn with_document_number(mut self, number: impl Into<String>) -> Self {
        self.document_number = number.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date_incoming = date;
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Adds a line whose sum is exactly `amount × price`
    pub fn with_line(mut self, product: impl Into<String>, amount: Decimal, price: Decimal) -> Self {
        self.lines.push((product.into(), amount, price));
        self
    }

    /// Builds the invoice, numbering lines from 1
    pub fn try_build(self) -> Result<Invoice, InvoiceError> {
        let items = self
            .lines
            .into_iter()
            .zip(1u32..)
            .map(|((product, amount, price), num)| {
                InvoiceItem::new(num, product, amount, price, amount * price)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Invoice::builder(self.supplier, self.store)
            .items(items)
            .document_number(self.document_number)
            .date_incoming(self.date_incoming);
        if let Some(conception) = self.conception {
            builder = builder.conception(conception);
        }
        if let Some(external_id) = self.external_id {
            builder = builder.external_id(external_id);
        }
        builder.build()
    }

    /// Builds the invoice, panicking on invalid data
    pub fn build(self) -> Invoice {
        self.try_build().expect("test invoice is valid")
    }
}
