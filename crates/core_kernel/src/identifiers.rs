//! Strongly-typed ERP reference identifiers
//!
//! The back-office system addresses products, suppliers, stores and
//! conceptions by opaque string identifiers (usually GUIDs). Wrapping each
//! kind in its own newtype prevents a supplier reference from being passed
//! where a store reference is expected.
//!
//! Resolution of human-readable names to these references happens upstream;
//! this crate only guarantees that a reference is non-blank.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_ref {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a reference, rejecting blank values
            pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::validation(concat!($label, " cannot be empty")));
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the raw identifier as sent on the wire
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Human-readable name of the reference kind
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_ref!(ProductRef, "Product reference");
define_ref!(SupplierRef, "Supplier reference");
define_ref!(StoreRef, "Store reference");
define_ref!(ConceptionRef, "Conception reference");
