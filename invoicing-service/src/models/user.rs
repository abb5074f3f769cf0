//! User record owned by the storage backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile row written at signup. `invoice_counter` holds the last invoice
/// number handed out to this user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub invoice_counter: i64,
}

impl UserRecord {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            company_name: company_name.into(),
            created_at: Utc::now(),
            invoice_counter: 0,
        }
    }
}
