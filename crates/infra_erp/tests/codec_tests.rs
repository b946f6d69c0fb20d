//! Wire-format tests for the invoice import codec

use proptest::prelude::*;
use rust_decimal_macros::dec;

use infra_erp::codec::{self, CodecError};
use infra_erp::ErpError;
use test_utils::{
    assert_element_text, assert_elements_in_order, invoice_strategy, InvoiceFixtures,
    ResponseFixtures, TestInvoiceBuilder,
};

// ============================================================================
// Encoding Tests
// ============================================================================

mod encode_tests {
    use super::*;

    #[test]
    fn test_element_order() {
        let xml = codec::encode(&InvoiceFixtures::full()).unwrap();
        assert_elements_in_order(
            &xml,
            &[
                "document",
                "items",
                "item",
                "num",
                "product",
                "amount",
                "price",
                "sum",
                "store",
                "supplier",
                "defaultStore",
                "conception",
                "documentNumber",
                "dateIncoming",
                "externalId",
            ],
        );
    }

    #[test]
    fn test_store_override_and_default() {
        let xml = codec::encode(&InvoiceFixtures::full()).unwrap();
        assert!(xml.contains("<num>2</num><product>P2</product><amount>0.750</amount><price>120.00</price><sum>90.00</sum><store>ST1</store>"));
        assert!(xml.contains("<num>3</num><product>P3</product><amount>12</amount><price>0.99</price><sum>11.88</sum><store>ST2</store>"));
    }

    #[test]
    fn test_optional_header_fields() {
        let xml = codec::encode(&InvoiceFixtures::full()).unwrap();
        assert_element_text(&xml, "conception", "C1");
        assert_element_text(&xml, "externalId", "chat-1001");
        assert_element_text(&xml, "dateIncoming", "2024-05-17T08:00:00");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let invoice = TestInvoiceBuilder::new()
            .with_line("P1", dec!(1.5), dec!(2.00))
            .with_line("P2", dec!(3), dec!(4.25))
            .build();

        assert_eq!(codec::encode(&invoice).unwrap(), codec::encode(&invoice).unwrap());
        assert_eq!(
            codec::encode(&invoice).unwrap(),
            codec::encode(&invoice.clone()).unwrap()
        );
    }
}

// ============================================================================
// Decoding Tests
// ============================================================================

mod decode_tests {
    use super::*;

    #[test]
    fn test_accepted() {
        let response = codec::decode(&ResponseFixtures::accepted("ERP-1")).unwrap();
        assert!(response.valid);
        assert_eq!(response.document_number.as_deref(), Some("ERP-1"));
    }

    #[test]
    fn test_rejected() {
        let response = codec::decode(&ResponseFixtures::rejected("Store is closed")).unwrap();
        assert!(!response.valid);
        assert_eq!(response.rejection_reason(), "Store is closed");
    }

    #[test]
    fn test_malformed_maps_to_http_error() {
        let err = codec::decode("<valid>true").unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse(_)));

        let erp: ErpError = err.into();
        assert!(matches!(erp, ErpError::Http { status: None, .. }));
    }

    #[test]
    fn test_supplier_formats_agree() {
        let from_json = codec::decode_suppliers(ResponseFixtures::suppliers_json()).unwrap();
        let from_xml = codec::decode_suppliers(ResponseFixtures::suppliers_xml()).unwrap();
        assert_eq!(from_json, from_xml);
        assert_eq!(from_json.len(), 2);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn every_line_is_encoded_once(invoice in invoice_strategy(8)) {
        let xml = codec::encode(&invoice).unwrap();
        prop_assert_eq!(xml.matches("<item>").count(), invoice.items().len());
        for item in invoice.items() {
            let num = format!("<num>{}</num>", item.num());
            prop_assert_eq!(xml.matches(num.as_str()).count(), 1);
        }
    }

    #[test]
    fn encoded_document_is_well_formed(invoice in invoice_strategy(4)) {
        let xml = codec::encode(&invoice).unwrap();
        // A well-formed document without <valid> decodes as a rejection
        let decoded = codec::decode(&xml).unwrap();
        prop_assert!(!decoded.valid);
    }
}
