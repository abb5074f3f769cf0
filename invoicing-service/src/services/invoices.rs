//! Owner-scoped invoice records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::{INVOICES_CREATED_TOTAL, INVOICES_DELETED_TOTAL, INVOICES_UPDATED_TOTAL};
use super::store::InvoiceStore;
use super::totals::{checked_invoice_totals, invoice_totals};
use super::ServiceError;
use crate::models::{Invoice, InvoiceFields};

pub const MAX_LINE_ITEMS: usize = 500;

/// Digits a stored amount keeps through its JSON number encoding.
pub const MAX_SIGNIFICANT_DIGITS: usize = 15;

/// One row of the invoice history view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    pub invoice_id: Uuid,
    pub invoice_number: i64,
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub date: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceSummary {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            company_name: invoice.fields.company_name.clone(),
            date: invoice.fields.date.clone(),
            total: invoice_totals(&invoice.fields.items).rounded().grand_total,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, fields), fields(items = fields.items.len()))]
    pub async fn create(
        &self,
        owner_id: &str,
        fields: InvoiceFields,
    ) -> Result<Invoice, ServiceError> {
        let fields = fields.without_reserved_keys();
        validate_fields(&fields)?;

        let invoice = self
            .store
            .insert_invoice(owner_id, &fields, Utc::now())
            .await?;

        metrics::counter!(INVOICES_CREATED_TOTAL).increment(1);
        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = invoice.invoice_number,
            "Invoice created"
        );
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, owner_id: &str, invoice_id: Uuid) -> Result<Invoice, ServiceError> {
        self.store
            .get_invoice(owner_id, invoice_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Newest first. No invoices is an empty list.
    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Invoice>, ServiceError> {
        self.store.list_invoices(owner_id).await
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, owner_id: &str) -> Result<Vec<InvoiceSummary>, ServiceError> {
        let invoices = self.store.list_invoices(owner_id).await?;
        Ok(invoices.iter().map(InvoiceSummary::from).collect())
    }

    /// Replace every editable field. Identity, number and `created_at` stay.
    #[instrument(skip(self, fields), fields(items = fields.items.len()))]
    pub async fn update(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
        fields: InvoiceFields,
    ) -> Result<Invoice, ServiceError> {
        let fields = fields.without_reserved_keys();
        validate_fields(&fields)?;

        let invoice = self
            .store
            .replace_invoice_fields(owner_id, invoice_id, &fields, Utc::now())
            .await?
            .ok_or(ServiceError::NotFound)?;

        metrics::counter!(INVOICES_UPDATED_TOTAL).increment(1);
        info!(invoice_id = %invoice_id, "Invoice updated");
        Ok(invoice)
    }

    /// Deleting an invoice that is absent or owned by someone else is a no-op.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, invoice_id: Uuid) -> Result<(), ServiceError> {
        if self.store.delete_invoice(owner_id, invoice_id).await? {
            metrics::counter!(INVOICES_DELETED_TOTAL).increment(1);
            info!(invoice_id = %invoice_id, "Invoice deleted");
        }
        Ok(())
    }
}

fn significant_digits(value: Decimal) -> usize {
    value.normalize().mantissa().unsigned_abs().to_string().len()
}

fn validate_fields(fields: &InvoiceFields) -> Result<(), ServiceError> {
    if fields.items.len() > MAX_LINE_ITEMS {
        return Err(ServiceError::Validation(format!(
            "An invoice can have at most {} items, got {}",
            MAX_LINE_ITEMS,
            fields.items.len()
        )));
    }

    for (idx, item) in fields.items.iter().enumerate() {
        if item.taxable_value < Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "items[{}].taxableValue must not be negative",
                idx
            )));
        }
        for (name, percent) in [
            ("cgstPercent", item.cgst_percent),
            ("sgstPercent", item.sgst_percent),
        ] {
            if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(ServiceError::Validation(format!(
                    "items[{}].{} must be between 0 and 100",
                    idx, name
                )));
            }
        }
        for (name, value) in [
            ("taxableValue", item.taxable_value),
            ("cgstPercent", item.cgst_percent),
            ("sgstPercent", item.sgst_percent),
        ] {
            if significant_digits(value) > MAX_SIGNIFICANT_DIGITS {
                return Err(ServiceError::Validation(format!(
                    "items[{}].{} has more than {} significant digits",
                    idx, name, MAX_SIGNIFICANT_DIGITS
                )));
            }
        }
    }

    if checked_invoice_totals(&fields.items).is_none() {
        return Err(ServiceError::Validation(
            "Invoice amounts are too large".to_string(),
        ));
    }

    Ok(())
}
