//! Signup, login and token checks over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{sample_invoice, TestApp, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn signup_returns_201_and_creates_user_record() {
    let app = TestApp::spawn();

    let response = app.signup("owner@acme.test", "Acme Traders").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "User created successfully");
    let user_id = response.body["userId"].as_str().expect("userId missing");

    let user = app
        .state
        .store
        .get_user(user_id)
        .await
        .unwrap()
        .expect("user record missing");
    assert_eq!(user.email, "owner@acme.test");
    assert_eq!(user.company_name, "Acme Traders");
    assert_eq!(user.invoice_counter, 0);
}

#[tokio::test]
async fn duplicate_signup_is_409() {
    let app = TestApp::spawn();
    app.signup("owner@acme.test", "Acme").await;

    let response = app.signup("OWNER@acme.test", "Acme again").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Email already registered");
}

#[tokio::test]
async fn failed_profile_write_leaves_no_account_behind() {
    let app = TestApp::spawn();
    app.state.store.close().await;

    let failed = app.signup("owner@acme.test", "Acme").await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);

    let login = app.login("owner@acme.test", TEST_PASSWORD).await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    // The email is free again at the identity provider.
    let user_id = app
        .state
        .identity
        .sign_up("owner@acme.test", TEST_PASSWORD, "Acme")
        .await
        .expect("email should be reusable");
    assert!(!user_id.is_empty());
}

#[tokio::test]
async fn signup_validation_failures_are_422() {
    let app = TestApp::spawn();

    let bad_email = app
        .request(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "not-an-email", "password": TEST_PASSWORD, "companyName": "A" })),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::UNPROCESSABLE_ENTITY);

    let short_password = app
        .request(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "a@acme.test", "password": "short", "companyName": "A" })),
        )
        .await;
    assert_eq!(short_password.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(short_password.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Validation error"));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::spawn();

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!("just a string")),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn login_returns_three_tokens() {
    let app = TestApp::spawn();
    app.signup("owner@acme.test", "Acme").await;

    let response = app.login("owner@acme.test", TEST_PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    for key in ["accessToken", "refreshToken", "idToken"] {
        assert!(
            response.body[key].as_str().is_some_and(|t| !t.is_empty()),
            "{} missing",
            key
        );
    }
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let app = TestApp::spawn();
    app.signup("owner@acme.test", "Acme").await;

    let wrong_password = app.login("owner@acme.test", "wrong-password").await;
    let unknown_user = app.login("nobody@acme.test", TEST_PASSWORD).await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "Invalid email or password");
}

#[tokio::test]
async fn invoice_routes_require_a_bearer_token() {
    let app = TestApp::spawn();

    let missing = app.request(Method::GET, "/invoices", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "Missing or invalid Authorization header");

    let garbage = app
        .request(Method::GET, "/invoices", Some("not.a.jwt"), None)
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["error"], "Invalid or expired token");

    let create = app
        .request(Method::POST, "/invoices", None, Some(sample_invoice()))
        .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn id_and_refresh_tokens_do_not_authorize() {
    let app = TestApp::spawn();
    app.signup("owner@acme.test", "Acme").await;
    let login = app.login("owner@acme.test", TEST_PASSWORD).await;

    for key in ["idToken", "refreshToken"] {
        let token = login.body[key].as_str().unwrap();
        let response = app.request(Method::GET, "/invoices", Some(token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{} was accepted", key);
    }
}

#[tokio::test]
async fn token_from_another_deployment_is_rejected() {
    let app = TestApp::spawn();
    let other = TestApp::spawn();

    // Same config, same secret: tokens are portable between the two.
    let token = other.access_token_for("owner@acme.test").await;
    let portable = app.request(Method::GET, "/invoices", Some(&token), None).await;
    assert_eq!(portable.status, StatusCode::OK);

    let mut config = common::test_config();
    config.jwt.secret = secrecy::Secret::new("a-completely-different-secret-value!!".to_string());
    let foreign = invoicing_service::startup::identity_provider(&config).unwrap();
    assert!(foreign.verify(&token).await.is_err());
}
