use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Which of the three issued tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Id,
    Refresh,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

/// Claims shared by access and id tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Company name, carried on id tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub token_use: TokenUse,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Claims for refresh tokens (long-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub token_use: TokenUse,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT secret must be at least 32 bytes, got {}",
                secret.len()
            ));
        }

        tracing::info!(issuer = %config.issuer, "JWT service initialized with HS256 secret");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        })
    }

    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, anyhow::Error> {
        self.sign_identity(user_id, email, None, TokenUse::Access)
    }

    pub fn generate_id_token(
        &self,
        user_id: &str,
        email: &str,
        company_name: &str,
    ) -> Result<String, anyhow::Error> {
        self.sign_identity(user_id, email, Some(company_name), TokenUse::Id)
    }

    fn sign_identity(
        &self,
        user_id: &str,
        email: &str,
        company_name: Option<&str>,
        token_use: TokenUse,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            company_name: company_name.map(str::to_string),
            token_use,
            iss: self.issuer.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode {:?} token: {}", token_use, e))
    }

    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(self.refresh_token_expiry_days);

        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            token_use: TokenUse::Refresh,
            iss: self.issuer.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode refresh token: {}", e))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }

    /// Validate signature, expiry and issuer, and require an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, anyhow::Error> {
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        if token_data.claims.token_use != TokenUse::Access {
            return Err(anyhow::anyhow!(
                "Expected an access token, got {:?}",
                token_data.claims.token_use
            ));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: Secret::new("test-secret-that-is-at-least-32-bytes!!".to_string()),
            issuer: "invoicing-service-test".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut config = test_config();
        config.secret = Secret::new("short".to_string());
        assert!(JwtService::new(&config).is_err());
    }

    #[test]
    fn test_access_token_generation_and_validation() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;

        let token = service.generate_access_token("user_123", "test@example.com")?;
        let claims = service.validate_access_token(&token)?;

        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.token_use, TokenUse::Access);
        assert_eq!(claims.iss, "invoicing-service-test");
        Ok(())
    }

    #[test]
    fn test_id_and_refresh_tokens_are_not_access_tokens() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;

        let id_token = service.generate_id_token("user_123", "test@example.com", "Acme")?;
        assert!(service.validate_access_token(&id_token).is_err());

        let refresh_token = service.generate_refresh_token("user_123")?;
        assert!(service.validate_access_token(&refresh_token).is_err());
        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected() -> Result<(), anyhow::Error> {
        let mut config = test_config();
        config.access_token_expiry_minutes = -5;
        let service = JwtService::new(&config)?;

        let token = service.generate_access_token("user_123", "test@example.com")?;
        assert!(service.validate_access_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn test_tampered_token_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let mine = service.generate_access_token("user_123", "test@example.com")?;
        let theirs = service.generate_access_token("someone_else", "other@example.com")?;

        // Their claims under my signature.
        let (their_body, _) = theirs
            .rsplit_once('.')
            .ok_or_else(|| anyhow::anyhow!("malformed token"))?;
        let (_, my_signature) = mine
            .rsplit_once('.')
            .ok_or_else(|| anyhow::anyhow!("malformed token"))?;
        let tampered = format!("{}.{}", their_body, my_signature);

        assert!(service.validate_access_token(&tampered).is_err());
        Ok(())
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let mut other = test_config();
        other.secret = Secret::new("another-secret-that-is-32-bytes-long!!".to_string());
        let other = JwtService::new(&other)?;

        let token = other.generate_access_token("user_123", "test@example.com")?;
        assert!(service.validate_access_token(&token).is_err());
        Ok(())
    }
}
