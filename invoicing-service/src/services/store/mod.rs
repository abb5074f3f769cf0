//! Persistence seam for users and invoices.
//!
//! Handlers never touch a backend directly; they hold an
//! `Arc<dyn InvoiceStore>` built at startup and closed on shutdown.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Invoice, InvoiceFields, UserRecord};
use crate::services::ServiceError;

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    /// Release backend resources. Calls after `close` fail with
    /// `ServiceError::Storage`.
    async fn close(&self);

    async fn put_user(&self, user: &UserRecord) -> Result<(), ServiceError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, ServiceError>;

    /// Bump the owner's invoice counter and insert the invoice under the new
    /// number as one atomic step. A missing user row starts at zero.
    async fn insert_invoice(
        &self,
        user_id: &str,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Invoice, ServiceError>;

    async fn get_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, ServiceError>;

    /// Owner's invoices, newest first.
    async fn list_invoices(&self, user_id: &str) -> Result<Vec<Invoice>, ServiceError>;

    /// Overwrite the fields of an owned invoice. `None` when no such invoice
    /// exists for this owner.
    async fn replace_invoice_fields(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Invoice>, ServiceError>;

    /// Returns whether a row was removed.
    async fn delete_invoice(&self, user_id: &str, invoice_id: Uuid) -> Result<bool, ServiceError>;
}
