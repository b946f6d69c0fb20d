//! Draft conversion tests

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use infra_erp::codec;
use interface_cli::{InvoiceDraft, ItemDraft};

const FULL_DRAFT: &str = r#"{
    "supplier": "S1",
    "store": "ST1",
    "conception": "C1",
    "document_number": "INV-77",
    "date_incoming": "2024-05-17",
    "external_id": "chat-9",
    "items": [
        {"product": "P1", "amount": "5", "price": "10.50", "sum": "52.50"},
        {"num": 7, "product": "P2", "amount": "0.750", "price": "120.00", "store": "ST2"}
    ]
}"#;

// ============================================================================
// Conversion Tests
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_full_draft_round_trips_to_xml() {
        let invoice = InvoiceDraft::from_json(FULL_DRAFT).unwrap().into_invoice().unwrap();
        let xml = codec::encode(&invoice).unwrap();

        assert!(xml.contains("<num>1</num><product>P1</product><amount>5</amount><price>10.50</price><sum>52.50</sum><store>ST1</store>"));
        assert!(xml.contains("<num>7</num><product>P2</product><amount>0.750</amount><price>120.00</price><sum>90.00</sum><store>ST2</store>"));
        assert!(xml.contains("<conception>C1</conception><documentNumber>INV-77</documentNumber><dateIncoming>2024-05-17T08:00:00</dateIncoming><externalId>chat-9</externalId>"));
    }

    #[test]
    fn test_duplicate_numbers_rejected() {
        let json = r#"{"supplier":"S1","store":"ST1","items":[
            {"num": 1, "product": "P1", "amount": "1", "price": "1"},
            {"num": 1, "product": "P2", "amount": "1", "price": "1"}
        ]}"#;
        let err = InvoiceDraft::from_json(json).unwrap().into_invoice().unwrap_err();
        assert!(err.to_string().contains("1"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(InvoiceDraft::from_json("{").is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn computed_sums_always_validate(
        amount in (1i64..1_000_000).prop_map(|n| Decimal::new(n, 3)),
        price in (0i64..1_000_000).prop_map(|n| Decimal::new(n, 2)),
    ) {
        let draft = InvoiceDraft {
            supplier: "S1".to_string(),
            store: "ST1".to_string(),
            conception: None,
            document_number: Some("INV-1".to_string()),
            date_incoming: None,
            external_id: None,
            items: vec![ItemDraft {
                num: None,
                product: "P1".to_string(),
                amount,
                price,
                sum: None,
                store: None,
            }],
        };

        let invoice = draft.into_invoice().unwrap();
        prop_assert_eq!(invoice.items()[0].sum().scale(), 2);
        prop_assert!((invoice.items()[0].sum() - amount * price).abs() <= dec!(0.005));
    }
}
