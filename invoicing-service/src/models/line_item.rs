//! Line item model for invoicing-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient::{lenient_decimal, lenient_string};

/// Tax rate the editor pre-fills for both CGST and SGST.
pub const DEFAULT_GST_PERCENT: Decimal = Decimal::from_parts(9, 0, 0, false, 0);

/// Amounts the editor shows next to a line. They are recomputed by
/// [`crate::services::totals`] and never stored.
const DERIVED_KEYS: &[&str] = &["cgstAmount", "sgstAmount", "totalValue", "lineTotal"];

/// One billed line on an invoice.
///
/// The three inputs are typed. Any other key the client sends (`hsnCode`,
/// `quantity`, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient_decimal"
    )]
    pub taxable_value: Decimal,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient_decimal"
    )]
    pub cgst_percent: Decimal,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient_decimal"
    )]
    pub sgst_percent: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// A line at the editor's default 9% + 9%.
    pub fn new(description: impl Into<String>, taxable_value: Decimal) -> Self {
        Self {
            description: description.into(),
            taxable_value,
            cgst_percent: DEFAULT_GST_PERCENT,
            sgst_percent: DEFAULT_GST_PERCENT,
            extra: Map::new(),
        }
    }

    pub fn with_rates(mut self, cgst_percent: Decimal, sgst_percent: Decimal) -> Self {
        self.cgst_percent = cgst_percent;
        self.sgst_percent = sgst_percent;
        self
    }

    /// Drop derived amounts a client echoed back with the line.
    pub fn without_derived_keys(mut self) -> Self {
        for key in DERIVED_KEYS {
            self.extra.remove(*key);
        }
        self
    }
}

impl Default for LineItem {
    fn default() -> Self {
        Self::new(String::new(), Decimal::ZERO)
    }
}
