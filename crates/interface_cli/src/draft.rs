//! Invoice drafts
//!
//! A draft is the JSON hand-off format produced upstream once every name
//! has been resolved to an ERP identifier. Quantities and prices should be
//! written as strings (`"10.50"`) so their scale survives parsing.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use domain_invoice::{Invoice, InvoiceError, InvoiceItem};

use crate::error::CliError;

/// Draft invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Line number; numbered by position when absent
    #[serde(default)]
    pub num: Option<u32>,
    pub product: String,
    pub amount: Decimal,
    pub price: Decimal,
    /// Line total; `amount × price` rounded to cents when absent
    #[serde(default)]
    pub sum: Option<Decimal>,
    #[serde(default)]
    pub store: Option<String>,
}

/// Draft invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub supplier: String,
    #[serde(alias = "default_store")]
    pub store: String,
    #[serde(default)]
    pub conception: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub date_incoming: Option<NaiveDate>,
    #[serde(default)]
    pub external_id: Option<String>,
    pub items: Vec<ItemDraft>,
}

impl InvoiceDraft {
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a draft from a file
    pub fn load(path: &str) -> Result<Self, CliError> {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Validates the draft into an invoice
    pub fn into_invoice(self) -> Result<Invoice, InvoiceError> {
        let items = self
            .items
            .into_iter()
            .zip(1u32..)
            .map(|(line, position)| line.into_item(position))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Invoice::builder(self.supplier, self.store).items(items);
        if let Some(conception) = self.conception {
            builder = builder.conception(conception);
        }
        if let Some(number) = self.document_number {
            builder = builder.document_number(number);
        }
        if let Some(date) = self.date_incoming {
            builder = builder.date_incoming(date);
        }
        if let Some(external_id) = self.external_id {
            builder = builder.external_id(external_id);
        }
        builder.build()
    }
}

impl ItemDraft {
    fn into_item(self, position: u32) -> Result<InvoiceItem, InvoiceError> {
        let num = self.num.unwrap_or(position);
        let sum = match self.sum {
            Some(sum) => sum,
            None => self
                .amount
                .checked_mul(self.price)
                .ok_or(InvoiceError::ArithmeticOverflow { num })?
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        };

        let item = InvoiceItem::new(num, self.product, self.amount, self.price, sum)?;
        match self.store {
            Some(store) => item.with_store(store),
            None => Ok(item),
        }
    }
}
