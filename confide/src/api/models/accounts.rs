//! Request and view models for the account-facing surface.

use serde::{Deserialize, Serialize};

use crate::db::models::accounts::AccountDBResponse;
use crate::types::AccountId;

/// Registration form body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Secret submission form body.
#[derive(Debug, Deserialize)]
pub struct SecretForm {
    pub secret: String,
}

/// Query parameters the identity provider sends to the callback route.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// The authenticated account attached to a request.
///
/// Produced by the extractor in [`crate::auth::current_account`]; a handler
/// taking this parameter is behind the authorization gate.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// One entry on the secrets page.
#[derive(Debug, Clone, Serialize)]
pub struct SecretView {
    pub author: String,
    pub secret: String,
}

impl From<AccountDBResponse> for SecretView {
    fn from(account: AccountDBResponse) -> Self {
        let author = account
            .display_name
            .or(account.username)
            .unwrap_or_else(|| "Anonymous".to_string());
        Self {
            author,
            secret: account.secret.unwrap_or_default(),
        }
    }
}
