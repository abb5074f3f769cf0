use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};
use tracing::instrument;

use crate::{
    dtos::auth::{LoginRequest, SignupRequest, SignupResponse},
    models::UserRecord,
    services::metrics::{record_login, SIGNUPS_TOTAL},
    utils::ValidatedJson,
    AppState,
};

/// Register an account and create its profile row.
#[instrument(skip(state, req))]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = state
        .identity
        .sign_up(&req.email, &req.password, &req.company_name)
        .await?;

    let profile = UserRecord::new(
        user_id.clone(),
        req.email.trim().to_lowercase(),
        req.company_name,
    );
    if let Err(e) = state.store.put_user(&profile).await {
        // Without a profile row the account is unusable; free the email.
        if let Err(rollback) = state.identity.delete_user(&user_id).await {
            tracing::error!(user_id = %user_id, error = %rollback, "Failed to roll back signup");
        }
        return Err(e.into());
    }

    metrics::counter!(SIGNUPS_TOTAL).increment(1);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id,
        }),
    ))
}

/// Exchange email and password for access, refresh and id tokens.
#[instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state.identity.initiate_auth(&req.email, &req.password).await {
        Ok(tokens) => {
            record_login("success");
            Ok((StatusCode::OK, Json(tokens)))
        }
        Err(e) => {
            record_login("failure");
            Err(e.into())
        }
    }
}
