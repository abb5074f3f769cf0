pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, InvoicingConfig};
use crate::services::{IdentityProvider, InvoiceService, InvoiceStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<InvoicingConfig>,
    pub store: Arc<dyn InvoiceStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub invoices: InvoiceService,
}

impl AppState {
    pub fn new(
        config: InvoicingConfig,
        store: Arc<dyn InvoiceStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            invoices: InvoiceService::new(store.clone()),
            store,
            identity,
        }
    }
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins = if cors.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(cors.allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Ignoring invalid CORS origin '{}': {}", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_router(state: AppState) -> Router {
    let invoice_routes = Router::new()
        .route(
            "/invoices",
            get(handlers::invoices::list_invoices)
                .post(handlers::invoices::create_invoice)
                .fallback(method_not_allowed),
        )
        .route(
            "/invoices/summary",
            get(handlers::invoices::invoice_summary).fallback(method_not_allowed),
        )
        .route(
            "/invoices/:invoice_id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice)
                .fallback(method_not_allowed),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route(
            "/health",
            get(handlers::health::health_check).fallback(method_not_allowed),
        )
        .route(
            "/ready",
            get(handlers::health::readiness_check).fallback(method_not_allowed),
        )
        .route(
            "/metrics",
            get(handlers::metrics::metrics).fallback(method_not_allowed),
        )
        .route(
            "/auth/signup",
            post(handlers::auth::signup).fallback(method_not_allowed),
        )
        .route(
            "/auth/login",
            post(handlers::auth::login).fallback(method_not_allowed),
        )
        .merge(invoice_routes)
        .fallback(handlers::not_found)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.cors))
}
