//! Invoice model for invoicing-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::lenient::{lenient_string, null_as_default};
use super::LineItem;

/// Keys owned by the service. A client echoing a stored invoice back on
/// update must not be able to overwrite them through the free-form fields.
const RESERVED_KEYS: &[&str] = &[
    "user_id",
    "invoice_id",
    "invoice_number",
    "created_at",
    "updated_at",
    "totals",
];

/// Contact block for the sender or receiver of an invoice.
///
/// Keys beyond the four shown on the invoice (`gstin`, ...) are kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client-editable part of an invoice.
///
/// Known fields are typed; anything else the client sends is kept verbatim
/// in `extra` and returned unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: Party,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receiver: Party,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceFields {
    /// Drop service-owned keys that arrived through the flattened maps.
    pub fn without_reserved_keys(mut self) -> Self {
        for key in RESERVED_KEYS {
            self.extra.remove(*key);
        }
        self.items = self
            .items
            .into_iter()
            .map(LineItem::without_derived_keys)
            .collect();
        self
    }
}

/// Stored invoice document.
///
/// Serialized flat, the way clients have always received it: record metadata
/// in snake_case next to the camelCase invoice fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub user_id: String,
    pub invoice_id: Uuid,
    pub invoice_number: i64,
    #[serde(flatten)]
    pub fields: InvoiceFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
