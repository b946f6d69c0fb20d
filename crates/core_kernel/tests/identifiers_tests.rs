//! Unit tests for the ERP reference identifiers
//!
//! Tests cover construction, trimming, parsing and conversion for every
//! reference kind.

use core_kernel::{ConceptionRef, ProductRef, StoreRef, SupplierRef};
use proptest::prelude::*;

mod product_ref_tests {
    use super::*;

    #[test]
    fn test_new_keeps_value() {
        let product = ProductRef::new("P1").unwrap();
        assert_eq!(product.as_str(), "P1");
        assert_eq!(product.to_string(), "P1");
    }

    #[test]
    fn test_empty_is_rejected_with_label() {
        let err = ProductRef::new("").unwrap_err();
        assert!(err.to_string().contains("Product reference"));
    }

    #[test]
    fn test_from_str() {
        let product: ProductRef = "5f1c8e2a-0000-4000-8000-000000000001".parse().unwrap();
        assert_eq!(product.as_str(), "5f1c8e2a-0000-4000-8000-000000000001");
    }

    #[test]
    fn test_into_string() {
        let product = ProductRef::new("P9").unwrap();
        let raw: String = product.into();
        assert_eq!(raw, "P9");
    }
}

mod other_ref_tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(ProductRef::label(), "Product reference");
        assert_eq!(SupplierRef::label(), "Supplier reference");
        assert_eq!(StoreRef::label(), "Store reference");
        assert_eq!(ConceptionRef::label(), "Conception reference");
    }

    #[test]
    fn test_whitespace_only_rejected() {
        assert!(SupplierRef::new("\t \n").is_err());
        assert!(ConceptionRef::try_from(" ").is_err());
    }

    #[test]
    fn test_try_from_string() {
        let store = StoreRef::try_from("ST1".to_string()).unwrap();
        assert_eq!(store.as_ref(), "ST1");
    }

    #[test]
    fn test_equality_and_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(StoreRef::new("ST1").unwrap());
        set.insert(StoreRef::new(" ST1 ").unwrap());
        assert_eq!(set.len(), 1);
    }
}

proptest! {
    #[test]
    fn non_blank_references_round_trip_through_display(raw in "[A-Za-z0-9-]{1,36}") {
        let supplier = SupplierRef::new(raw.clone()).unwrap();
        prop_assert_eq!(supplier.to_string(), raw);
    }
}
