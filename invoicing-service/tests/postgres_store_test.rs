//! Store behaviour against a real PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::Utc;
use futures::future::join_all;
use invoicing_service::{
    models::{InvoiceFields, LineItem, UserRecord},
    services::{InvoiceStore, PostgresStore},
};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

async fn store() -> PostgresStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PostgresStore::connect(&url, 10, 1)
        .await
        .expect("Failed to connect to PostgreSQL")
}

fn fresh_user() -> String {
    format!("pg-test-{}", Uuid::new_v4())
}

fn fields() -> InvoiceFields {
    let mut fields = InvoiceFields {
        company_name: "Acme Traders".to_string(),
        date: "2024-04-01".to_string(),
        items: vec![LineItem::new("Consulting", Decimal::new(1000, 0))],
        ..Default::default()
    };
    fields.extra.insert("notes".to_string(), json!("Net 30"));
    fields
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insert_get_update_delete() {
    let store = store().await;
    let user = fresh_user();
    store
        .put_user(&UserRecord::new(&user, "pg@acme.test", "Acme"))
        .await
        .unwrap();

    let created = store.insert_invoice(&user, &fields(), Utc::now()).await.unwrap();
    assert_eq!(created.invoice_number, 1);

    let fetched = store
        .get_invoice(&user, created.invoice_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.fields, fields());
    assert!(store
        .get_invoice("someone-else", created.invoice_id)
        .await
        .unwrap()
        .is_none());

    let mut replacement = fields();
    replacement.company_name = "Renamed".to_string();
    let updated = store
        .replace_invoice_fields(&user, created.invoice_id, &replacement, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.invoice_number, 1);
    assert_eq!(updated.fields.company_name, "Renamed");

    assert!(store.delete_invoice(&user, created.invoice_id).await.unwrap());
    assert!(!store.delete_invoice(&user, created.invoice_id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_inserts_get_distinct_numbers() {
    let store = Arc::new(store().await);
    let user = fresh_user();

    let created = join_all((0..20).map(|_| {
        let store = store.clone();
        let user = user.clone();
        async move { store.insert_invoice(&user, &fields(), Utc::now()).await }
    }))
    .await;

    let mut numbers: Vec<i64> = created
        .into_iter()
        .map(|r| r.unwrap().invoice_number)
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=20).collect::<Vec<i64>>());

    let listed = store.list_invoices(&user).await.unwrap();
    assert_eq!(listed.first().map(|i| i.invoice_number), Some(20));
    assert_eq!(
        store.get_user(&user).await.unwrap().unwrap().invoice_counter,
        20
    );
}
