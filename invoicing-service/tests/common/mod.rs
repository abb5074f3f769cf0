//! Shared helpers for invoicing-service integration tests.
//!
//! Every `TestApp` gets its own in-memory store and identity provider, and
//! requests go straight into the router with `oneshot`; no socket is bound.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use invoicing_service::{
    build_router,
    config::{
        CorsConfig, Environment, InvoicingConfig, JwtConfig, StorageBackend, StorageConfig,
    },
    services::{InvoiceStore, MemoryStore},
    startup::identity_provider,
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> InvoicingConfig {
    InvoicingConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "invoicing-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 5,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new("integration-test-secret-with-enough-bytes".to_string()),
            issuer: "invoicing-service-test".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let store: Arc<dyn InvoiceStore> = Arc::new(MemoryStore::open());
        let identity = identity_provider(&config).expect("Failed to build identity provider");
        let state = AppState::new(config, store, identity);

        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn signup(&self, email: &str, company_name: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": TEST_PASSWORD,
                "companyName": company_name,
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Sign up a fresh account and return its access token.
    pub async fn access_token_for(&self, email: &str) -> String {
        let signup = self.signup(email, "Test Traders").await;
        assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.body);

        let login = self.login(email, TEST_PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);

        login.body["accessToken"]
            .as_str()
            .expect("accessToken missing")
            .to_string()
    }

    pub async fn create_invoice(&self, token: &str, fields: Value) -> TestResponse {
        self.request(Method::POST, "/invoices", Some(token), Some(fields))
            .await
    }
}

/// A typical two-line invoice body as the editor submits it.
pub fn sample_invoice() -> Value {
    json!({
        "companyName": "Acme Traders",
        "date": "2024-04-01",
        "sender": {
            "name": "Acme Traders",
            "address": "12 MG Road, Bengaluru",
            "phone": "+91 80 1234 5678",
            "email": "billing@acme.test"
        },
        "receiver": {
            "name": "Globex",
            "address": "4 Park Street, Kolkata",
            "phone": "",
            "email": "accounts@globex.test"
        },
        "items": [
            { "description": "Consulting", "taxableValue": 1000, "cgstPercent": 9, "sgstPercent": 9 },
            { "description": "Travel", "taxableValue": "250.50", "cgstPercent": 6, "sgstPercent": 6 }
        ],
        "notes": "Payment due in 30 days"
    })
}
