use serde::Serialize;

use crate::models::Invoice;
use crate::services::{invoice_totals, InvoiceSummary, InvoiceTotals};

/// An invoice as clients see it: the stored record plus totals computed
/// from its line items at response time.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub totals: InvoiceTotals,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let totals = invoice_totals(&invoice.fields.items).rounded();
        Self { invoice, totals }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceEnvelope {
    pub invoice: InvoiceResponse,
}

#[derive(Debug, Serialize)]
pub struct InvoiceMutationResponse {
    pub message: String,
    pub invoice: InvoiceResponse,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceSummaryResponse {
    pub invoices: Vec<InvoiceSummary>,
}
