//! Identity gateway: signup, password login and token verification.
//!
//! Handlers depend on [`IdentityProvider`] only. [`LocalIdentityProvider`]
//! keeps credentials in process and mints its own JWTs; a managed identity
//! provider can be put behind the same trait.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::jwt::JwtService;
use super::ServiceError;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

/// Tokens returned by a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
}

/// Identity proven by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and return its user id.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
    ) -> Result<String, ServiceError>;

    async fn initiate_auth(&self, email: &str, password: &str)
        -> Result<AuthTokens, ServiceError>;

    /// Check signature, expiry and token type before trusting any claim.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, ServiceError>;

    /// Remove an account, e.g. when the rest of signup failed. Unknown ids
    /// are a no-op.
    async fn delete_user(&self, user_id: &str) -> Result<(), ServiceError>;
}

struct Credential {
    user_id: String,
    company_name: String,
    password_hash: PasswordHashString,
}

/// In-process identity provider backed by argon2 hashes and HS256 JWTs.
pub struct LocalIdentityProvider {
    jwt: JwtService,
    /// Keyed by normalized email.
    credentials: DashMap<String, Credential>,
}

impl LocalIdentityProvider {
    pub fn new(jwt: JwtService) -> Self {
        Self {
            jwt,
            credentials: DashMap::new(),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    #[instrument(skip(self, password, company_name))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
    ) -> Result<String, ServiceError> {
        let password_hash = hash_password(&Password::new(password.to_string()))
            .map_err(ServiceError::Upstream)?;

        match self.credentials.entry(normalize_email(email)) {
            Entry::Occupied(_) => {
                warn!("Signup attempted for an existing email");
                Err(ServiceError::EmailAlreadyRegistered)
            }
            Entry::Vacant(slot) => {
                let user_id = Uuid::new_v4().to_string();
                slot.insert(Credential {
                    user_id: user_id.clone(),
                    company_name: company_name.to_string(),
                    password_hash,
                });
                info!(user_id = %user_id, "User signed up");
                Ok(user_id)
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn initiate_auth(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ServiceError> {
        let email = normalize_email(email);

        // Clone out of the map so no shard lock is held while hashing.
        let (user_id, company_name, password_hash) = match self.credentials.get(&email) {
            Some(credential) => (
                credential.user_id.clone(),
                credential.company_name.clone(),
                credential.password_hash.clone(),
            ),
            None => return Err(ServiceError::InvalidCredentials),
        };

        verify_password(&Password::new(password.to_string()), &password_hash)
            .map_err(|_| ServiceError::InvalidCredentials)?;

        let tokens = AuthTokens {
            access_token: self
                .jwt
                .generate_access_token(&user_id, &email)
                .map_err(ServiceError::Upstream)?,
            refresh_token: self
                .jwt
                .generate_refresh_token(&user_id)
                .map_err(ServiceError::Upstream)?,
            id_token: self
                .jwt
                .generate_id_token(&user_id, &email, &company_name)
                .map_err(ServiceError::Upstream)?,
        };

        info!(user_id = %user_id, "User logged in");
        Ok(tokens)
    }

    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, ServiceError> {
        let claims = self.jwt.validate_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            ServiceError::Authentication
        })?;

        Ok(VerifiedIdentity {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), ServiceError> {
        self.credentials
            .retain(|_, credential| credential.user_id != user_id);
        info!(user_id = %user_id, "User removed");
        Ok(())
    }
}
