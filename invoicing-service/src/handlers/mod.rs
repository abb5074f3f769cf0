pub mod auth;
pub mod health;
pub mod invoices;
pub mod metrics;

use service_core::axum::http::StatusCode;
use service_core::axum::Json;

use crate::dtos::MessageResponse;

/// Fallback for paths no route matches.
pub async fn not_found() -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new("Not found")))
}
