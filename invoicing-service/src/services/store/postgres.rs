use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

use super::InvoiceStore;
use crate::models::{Invoice, InvoiceFields, UserRecord};
use crate::services::metrics::record_store_latency;
use crate::services::ServiceError;

#[derive(FromRow)]
struct InvoiceRow {
    user_id: String,
    invoice_id: Uuid,
    invoice_number: i64,
    fields: Json<InvoiceFields>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            user_id: row.user_id,
            invoice_id: row.invoice_id,
            invoice_number: row.invoice_number,
            fields: row.fields.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const INVOICE_COLUMNS: &str =
    "user_id, invoice_id, invoice_number, fields, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new connection pool and apply pending migrations.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, ServiceError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), ServiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for PostgresStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing PostgreSQL connection pool");
        self.pool.close().await;
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn put_user(&self, user: &UserRecord) -> Result<(), ServiceError> {
        let started = Instant::now();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, company_name, created_at, invoice_counter)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET email = EXCLUDED.email,
                company_name = EXCLUDED.company_name
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.company_name)
        .bind(user.created_at)
        .bind(user.invoice_counter)
        .execute(&self.pool)
        .await?;

        record_store_latency("put_user", started);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, ServiceError> {
        let started = Instant::now();

        let row: Option<(String, String, String, DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, email, company_name, created_at, invoice_counter
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        record_store_latency("get_user", started);

        Ok(row.map(
            |(user_id, email, company_name, created_at, invoice_counter)| UserRecord {
                user_id,
                email,
                company_name,
                created_at,
                invoice_counter,
            },
        ))
    }

    #[instrument(skip(self, fields))]
    async fn insert_invoice(
        &self,
        user_id: &str,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Invoice, ServiceError> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        // The upsert takes the user row lock until commit, so concurrent
        // creates for the same owner serialize here.
        let (invoice_number,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (user_id, created_at, invoice_counter)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET invoice_counter = users.invoice_counter + 1
            RETURNING invoice_counter
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let row: InvoiceRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO invoices (user_id, invoice_id, invoice_number, fields, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(Uuid::new_v4())
        .bind(invoice_number)
        .bind(Json(fields))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        record_store_latency("insert_invoice", started);

        info!(invoice_id = %row.invoice_id, invoice_number, "Invoice stored");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, ServiceError> {
        let started = Instant::now();

        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = $1 AND invoice_id = $2"
        ))
        .bind(user_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        record_store_latency("get_invoice", started);
        Ok(row.map(Invoice::from))
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self, user_id: &str) -> Result<Vec<Invoice>, ServiceError> {
        let started = Instant::now();

        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = $1 ORDER BY invoice_number DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        record_store_latency("list_invoices", started);
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    #[instrument(skip(self, fields))]
    async fn replace_invoice_fields(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        fields: &InvoiceFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Invoice>, ServiceError> {
        let started = Instant::now();

        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            r#"
            UPDATE invoices
            SET fields = $3, updated_at = $4
            WHERE user_id = $1 AND invoice_id = $2
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(invoice_id)
        .bind(Json(fields))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        record_store_latency("replace_invoice_fields", started);
        Ok(row.map(Invoice::from))
    }

    #[instrument(skip(self))]
    async fn delete_invoice(&self, user_id: &str, invoice_id: Uuid) -> Result<bool, ServiceError> {
        let started = Instant::now();

        let result = sqlx::query("DELETE FROM invoices WHERE user_id = $1 AND invoice_id = $2")
            .bind(user_id)
            .bind(invoice_id)
            .execute(&self.pool)
            .await?;

        record_store_latency("delete_invoice", started);
        Ok(result.rows_affected() > 0)
    }
}
