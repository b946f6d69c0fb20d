//! Pre-built Test Fixtures
//!
//! Ready-to-use invoices and ERP response bodies. Everything here is
//! deterministic apart from generated document numbers, which the fixtures
//! avoid by always setting one.

use chrono::NaiveDate;
use domain_invoice::{Invoice, InvoiceItem};
use rust_decimal_macros::dec;

/// Fixture for invoices
pub struct InvoiceFixtures;

impl InvoiceFixtures {
    /// The canonical line: 5 × 10.50 = 52.50 of product P1
    pub fn line(num: u32) -> InvoiceItem {
        InvoiceItem::new(num, "P1", dec!(5), dec!(10.50), dec!(52.50))
            .expect("fixture line is valid")
    }

    /// One line, supplier S1, store ST1
    pub fn single_line() -> Invoice {
        Invoice::builder("S1", "ST1")
            .item(Self::line(1))
            .document_number("INV-0001")
            .date_incoming(DateFixtures::incoming())
            .build()
            .expect("fixture invoice is valid")
    }

    /// Three lines, one with its own store, all optional header fields set
    pub fn full() -> Invoice {
        let lines = vec![
            Self::line(1),
            InvoiceItem::new(2, "P2", dec!(0.750), dec!(120.00), dec!(90.00))
                .expect("fixture line is valid"),
            InvoiceItem::new(3, "P3", dec!(12), dec!(0.99), dec!(11.88))
                .and_then(|item| item.with_store("ST2"))
                .expect("fixture line is valid"),
        ];

        Invoice::builder("S1", "ST1")
            .items(lines)
            .conception("C1")
            .document_number("INV-0002")
            .date_incoming(DateFixtures::incoming())
            .external_id("chat-1001")
            .build()
            .expect("fixture invoice is valid")
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// Standard incoming date (May 17, 2024)
    pub fn incoming() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).expect("valid date")
    }
}

/// Fixture for ERP response bodies
pub struct ResponseFixtures;

impl ResponseFixtures {
    /// Accepted import with an ERP-assigned number
    pub fn accepted(document_number: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<documentValidationResult>\n  <valid>true</valid>\n  <warning>false</warning>\n  <documentNumber>{}</documentNumber>\n</documentValidationResult>",
            document_number
        )
    }

    /// Rejected import with a reason
    pub fn rejected(reason: &str) -> String {
        format!(
            "<documentValidationResult><valid>false</valid><error>{}</error></documentValidationResult>",
            reason
        )
    }

    /// Supplier directory as JSON
    pub fn suppliers_json() -> &'static str {
        r#"[{"id":"S1","name":"Fresh Produce Ltd"},{"id":"S2","name":"Dairy Co"}]"#
    }

    /// Supplier directory as XML
    pub fn suppliers_xml() -> &'static str {
        "<employees><employee><id>S1</id><name>Fresh Produce Ltd</name></employee><employee><id>S2</id><name>Dairy Co</name></employee></employees>"
    }
}
