use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid or expired token")]
    Authentication,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invoice not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Identity provider error: {0}")]
    Upstream(anyhow::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Storage(anyhow::Error::new(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Authentication => {
                AppError::AuthError(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::NotFound => AppError::NotFound(anyhow::anyhow!("Invoice not found")),
            ServiceError::Validation(msg) => AppError::Unprocessable(anyhow::anyhow!(msg)),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::Storage(e) => AppError::DatabaseError(e),
            ServiceError::Upstream(e) => AppError::BadGateway(e),
        }
    }
}
