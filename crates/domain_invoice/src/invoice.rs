//! Incoming invoice aggregate
//!
//! An `Invoice` is built once from fully-resolved data and is read-only
//! afterwards; edits happen upstream before construction. Missing document
//! number and incoming date are filled in at build time.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use core_kernel::{ConceptionRef, StoreRef, SupplierRef};

use crate::error::InvoiceError;
use crate::item::InvoiceItem;

/// Prefix of generated document numbers
pub const AUTO_DOCUMENT_PREFIX: &str = "AUTO";

/// A validated incoming invoice ready for ERP import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    items: Vec<InvoiceItem>,
    supplier: SupplierRef,
    default_store: StoreRef,
    conception: Option<ConceptionRef>,
    document_number: String,
    date_incoming: NaiveDate,
    external_id: Option<String>,
}

impl Invoice {
    /// Starts building an invoice for the given supplier and default store
    pub fn builder(supplier: impl Into<String>, default_store: impl Into<String>) -> InvoiceBuilder {
        InvoiceBuilder::new(supplier, default_store)
    }

    /// Creates an invoice with only the required fields
    pub fn new(
        items: Vec<InvoiceItem>,
        supplier: impl Into<String>,
        default_store: impl Into<String>,
    ) -> Result<Self, InvoiceError> {
        Self::builder(supplier, default_store).items(items).build()
    }

    /// Line items in document order
    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    /// Supplier reference
    pub fn supplier(&self) -> &SupplierRef {
        &self.supplier
    }

    /// Store used by lines without an override
    pub fn default_store(&self) -> &StoreRef {
        &self.default_store
    }

    /// Conception (restaurant/concept) reference
    pub fn conception(&self) -> Option<&ConceptionRef> {
        self.conception.as_ref()
    }

    /// Document number, either supplied or generated
    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    /// Incoming date, defaulting to the day of construction
    pub fn date_incoming(&self) -> NaiveDate {
        self.date_incoming
    }

    /// Caller-side correlation identifier
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Effective store for a line: its own override or the invoice default
    pub fn store_for<'a>(&'a self, item: &'a InvoiceItem) -> &'a StoreRef {
        item.store().unwrap_or(&self.default_store)
    }

    /// Sum of all line totals
    pub fn total(&self) -> Decimal {
        self.items.iter().map(InvoiceItem::sum).sum()
    }
}

/// Builder for incoming invoices
///
/// # Example
///
/// ```rust
/// use domain_invoice::{Invoice, InvoiceItem};
/// use rust_decimal_macros::dec;
///
/// let item = InvoiceItem::new(1, "P1", dec!(5), dec!(10.50), dec!(52.50)).unwrap();
/// let invoice = Invoice::builder("S1", "ST1")
///     .item(item)
///     .document_number("INV-42")
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.document_number(), "INV-42");
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    items: Vec<InvoiceItem>,
    supplier: String,
    default_store: String,
    conception: Option<String>,
    document_number: Option<String>,
    date_incoming: Option<NaiveDate>,
    external_id: Option<String>,
}

impl InvoiceBuilder {
    /// Creates a builder with the required references
    pub fn new(supplier: impl Into<String>, default_store: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            supplier: supplier.into(),
            default_store: default_store.into(),
            conception: None,
            document_number: None,
            date_incoming: None,
            external_id: None,
        }
    }

    /// Appends a line item
    pub fn item(mut self, item: InvoiceItem) -> Self {
        self.items.push(item);
        self
    }

    /// Appends several line items
    pub fn items(mut self, items: impl IntoIterator<Item = InvoiceItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Sets the conception reference
    pub fn conception(mut self, conception: impl Into<String>) -> Self {
        self.conception = Some(conception.into());
        self
    }

    /// Sets the document number; blank values fall back to a generated one
    pub fn document_number(mut self, number: impl Into<String>) -> Self {
        self.document_number = Some(number.into());
        self
    }

    /// Sets the incoming date
    pub fn date_incoming(mut self, date: NaiveDate) -> Self {
        self.date_incoming = Some(date);
        self
    }

    /// Sets the external correlation identifier
    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Validates and builds the invoice
    ///
    /// # Errors
    ///
    /// Returns an `InvoiceError` if there are no items, a reference is blank,
    /// two lines share a line number or the incoming date is after tomorrow.
    pub fn build(self) -> Result<Invoice, InvoiceError> {
        if self.items.is_empty() {
            return Err(InvoiceError::EmptyInvoice);
        }

        let supplier = SupplierRef::new(self.supplier)?;
        let default_store = StoreRef::new(self.default_store)?;
        let conception = self.conception.map(ConceptionRef::new).transpose()?;

        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.num()) {
                return Err(InvoiceError::DuplicateLineNumber(item.num()));
            }
        }

        let today = Local::now().date_naive();
        let date_incoming = self.date_incoming.unwrap_or(today);
        let max_date = today.succ_opt().unwrap_or(today);
        if date_incoming > max_date {
            return Err(InvoiceError::FutureDate {
                date: date_incoming,
                max_date,
            });
        }

        let document_number = match non_blank(self.document_number) {
            Some(number) => number,
            None => {
                let generated = generate_document_number(today);
                tracing::info!(document_number = %generated, "Using auto-generated document number");
                generated
            }
        };

        Ok(Invoice {
            items: self.items,
            supplier,
            default_store,
            conception,
            document_number,
            date_incoming,
            external_id: non_blank(self.external_id),
        })
    }
}

/// Generates a document number
///
/// Format: AUTO-{YYYYMMDD}-{8 uppercase hex digits}
pub fn generate_document_number(date: NaiveDate) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        AUTO_DOCUMENT_PREFIX,
        date.format("%Y%m%d"),
        random[..8].to_uppercase()
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(num: u32) -> InvoiceItem {
        InvoiceItem::new(num, "P1", dec!(2), dec!(3.00), dec!(6.00)).unwrap()
    }

    #[test]
    fn test_defaults_are_filled() {
        let invoice = Invoice::new(vec![item(1)], "S1", "ST1").unwrap();
        assert!(invoice.document_number().starts_with("AUTO-"));
        assert_eq!(invoice.date_incoming(), Local::now().date_naive());
        assert!(invoice.external_id().is_none());
    }

    #[test]
    fn test_generated_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let number = generate_document_number(date);
        assert!(number.starts_with("AUTO-20240309-"));
        let suffix = &number["AUTO-20240309-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_store_for_uses_override() {
        let plain = item(1);
        let overridden = item(2).with_store("ST2").unwrap();
        let invoice = Invoice::new(vec![plain, overridden], "S1", "ST1").unwrap();

        assert_eq!(invoice.store_for(&invoice.items()[0]).as_str(), "ST1");
        assert_eq!(invoice.store_for(&invoice.items()[1]).as_str(), "ST2");
    }

    #[test]
    fn test_incoming_date_up_to_tomorrow() {
        let today = Local::now().date_naive();
        let tomorrow = today.succ_opt().unwrap();

        let invoice = Invoice::builder("S1", "ST1")
            .item(item(1))
            .date_incoming(tomorrow)
            .build()
            .unwrap();
        assert_eq!(invoice.date_incoming(), tomorrow);

        let err = Invoice::builder("S1", "ST1")
            .item(item(1))
            .date_incoming(tomorrow.succ_opt().unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, InvoiceError::FutureDate { max_date, .. } if max_date == tomorrow));
    }

    #[test]
    fn test_total() {
        let invoice = Invoice::new(vec![item(1), item(2)], "S1", "ST1").unwrap();
        assert_eq!(invoice.total(), dec!(12.00));
    }
}
