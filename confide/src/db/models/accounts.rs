//! Database models for accounts.

use crate::types::AccountId;
use chrono::{DateTime, Utc};

/// Database request for creating a new account.
///
/// An account is reachable through local credentials, a federated identity,
/// or both; the schema rejects rows with neither.
#[derive(Debug, Clone)]
pub struct AccountCreateDBRequest {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub external_id: Option<String>,
    pub display_name: Option<String>,
}

impl AccountCreateDBRequest {
    /// A local-auth account: username plus password credential.
    pub fn local(username: &str, password_hash: String) -> Self {
        Self {
            username: Some(username.to_string()),
            password_hash: Some(password_hash),
            external_id: None,
            display_name: None,
        }
    }

    /// A federated account keyed by the identity provider's subject id.
    pub fn federated(external_id: &str, display_name: Option<&str>) -> Self {
        Self {
            username: None,
            password_hash: None,
            external_id: Some(external_id.to_string()),
            display_name: display_name.map(|s| s.to_string()),
        }
    }
}

/// Database request for updating an account
#[derive(Debug, Clone, Default)]
pub struct AccountUpdateDBRequest {
    pub display_name: Option<String>,
    pub secret: Option<String>,
}

/// Database response for an account
#[derive(Debug, Clone)]
pub struct AccountDBResponse {
    pub id: AccountId,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
