//! Supplier directory records as listed by the ERP

use serde::{Deserialize, Serialize};

/// A supplier known to the ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    /// ERP supplier identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

impl SupplierRecord {
    /// Creates a supplier record
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
