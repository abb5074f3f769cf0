use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    dtos::{
        invoices::{
            InvoiceEnvelope, InvoiceListResponse, InvoiceMutationResponse, InvoiceResponse,
            InvoiceSummaryResponse,
        },
        MessageResponse,
    },
    middleware::AuthUser,
    models::InvoiceFields,
    services::ServiceError,
    utils::JsonBody,
    AppState,
};

/// Ids that do not parse cannot name a stored invoice.
fn parse_invoice_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::NotFound)
}

#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(fields): JsonBody<InvoiceFields>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.invoices.create(&user.0.user_id, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceMutationResponse {
            message: "Invoice created successfully".to_string(),
            invoice: invoice.into(),
        }),
    ))
}

#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let invoices = state.invoices.list(&user.0.user_id).await?;

    Ok(Json(InvoiceListResponse {
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
    }))
}

#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn invoice_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let invoices = state.invoices.summary(&user.0.user_id).await?;
    Ok(Json(InvoiceSummaryResponse { invoices }))
}

#[instrument(skip_all, fields(user_id = %user.0.user_id, invoice_id = %invoice_id))]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let invoice = state.invoices.get(&user.0.user_id, invoice_id).await?;

    Ok(Json(InvoiceEnvelope {
        invoice: invoice.into(),
    }))
}

#[instrument(skip_all, fields(user_id = %user.0.user_id, invoice_id = %invoice_id))]
pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
    JsonBody(fields): JsonBody<InvoiceFields>,
) -> Result<impl IntoResponse, AppError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let invoice = state
        .invoices
        .update(&user.0.user_id, invoice_id, fields)
        .await?;

    Ok(Json(InvoiceMutationResponse {
        message: "Invoice updated successfully".to_string(),
        invoice: invoice.into(),
    }))
}

#[instrument(skip_all, fields(user_id = %user.0.user_id, invoice_id = %invoice_id))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // A malformed id names nothing, so there is nothing to delete.
    if let Ok(invoice_id) = Uuid::parse_str(&invoice_id) {
        state.invoices.delete(&user.0.user_id, invoice_id).await?;
    }

    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}
