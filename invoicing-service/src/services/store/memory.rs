use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::InvoiceStore;
use crate::models::{Invoice, InvoiceFields, UserRecord};
use crate::services::ServiceError;

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRecord>,
    /// Keyed by owner, then invoice id.
    invoices: HashMap<String, HashMap<Uuid, Invoice>>,
}

/// Process-local store for development and tests.
///
/// Both tables sit behind one mutex, so numbering and insertion happen under
/// the same lock.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::open()
    }
}

impl MemoryStore {
    pub fn open() -> Self {
        tracing::info!("Opened in-memory invoice store");
        Self {
            tables: Mutex::new(Tables::default()),
            closed: AtomicBool::new(false),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, ServiceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ServiceError::Storage(anyhow::anyhow!("Store is closed")));
        }
        self.tables
            .lock()
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.tables().map(|_| ())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        tracing::info!("Closed in-memory invoice store");
    }

    async fn put_user(&self, user: &UserRecord) -> Result<(), ServiceError> {
        self.tables()?
            .users
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, ServiceError> {
        Ok(self.tables()?.users.get(user_id).cloned())
    }

    async fn insert_invoice(
        &self,
        user_id: &str,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Invoice, ServiceError> {
        let mut tables = self.tables()?;

        let user = tables
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord {
                user_id: user_id.to_string(),
                email: String::new(),
                company_name: String::new(),
                created_at: now,
                invoice_counter: 0,
            });
        user.invoice_counter += 1;

        let invoice = Invoice {
            user_id: user_id.to_string(),
            invoice_id: Uuid::new_v4(),
            invoice_number: user.invoice_counter,
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        };

        tables
            .invoices
            .entry(user_id.to_string())
            .or_default()
            .insert(invoice.invoice_id, invoice.clone());

        Ok(invoice)
    }

    async fn get_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, ServiceError> {
        Ok(self
            .tables()?
            .invoices
            .get(user_id)
            .and_then(|owned| owned.get(&invoice_id))
            .cloned())
    }

    async fn list_invoices(&self, user_id: &str) -> Result<Vec<Invoice>, ServiceError> {
        let mut invoices: Vec<Invoice> = self
            .tables()?
            .invoices
            .get(user_id)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default();

        invoices.sort_by(|a, b| b.invoice_number.cmp(&a.invoice_number));
        Ok(invoices)
    }

    async fn replace_invoice_fields(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Invoice>, ServiceError> {
        let mut tables = self.tables()?;
        let Some(invoice) = tables
            .invoices
            .get_mut(user_id)
            .and_then(|owned| owned.get_mut(&invoice_id))
        else {
            return Ok(None);
        };

        invoice.fields = fields.clone();
        invoice.updated_at = now;
        Ok(Some(invoice.clone()))
    }

    async fn delete_invoice(&self, user_id: &str, invoice_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self
            .tables()?
            .invoices
            .get_mut(user_id)
            .and_then(|owned| owned.remove(&invoice_id))
            .is_some())
    }
}
