//! Extractor that applies the authorization gate to a request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    api::models::accounts::CurrentAccount,
    auth::{
        gate::{self, Access},
        session::{self, Resolution},
    },
    db::handlers::{Accounts, Repository},
    errors::{Error, Result},
    AppState,
};

/// Resolve the request's session cookie to an identity.
///
/// Anything short of a verified cookie naming a live session is `Anonymous`:
/// no cookie, an unparseable header, a bad signature, an unknown token.
fn resolve_session(parts: &Parts, state: &AppState) -> Resolution {
    let Some(secret_key) = state.config.secret_key.as_deref() else {
        return Resolution::Anonymous;
    };
    match session::token_from_headers(&parts.headers, &state.config.auth.session.cookie_name, secret_key) {
        Some(token) => state.sessions.resolve(&token),
        None => Resolution::Anonymous,
    }
}

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let resolution = resolve_session(parts, state);

        // Re-read the account: a session may outlive its account
        let account = match resolution {
            Resolution::Authenticated(account_id) => {
                let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
                Accounts::new(&mut conn).get_by_id(account_id).await?
            }
            Resolution::Anonymous => None,
        };

        match gate::authorize(resolution, account.is_some()) {
            Access::Admit(account_id) => {
                trace!("Admitted session for account {account_id}");
                let account = account.ok_or(Error::Unauthenticated { message: None })?;
                Ok(CurrentAccount {
                    id: account.id,
                    username: account.username,
                    display_name: account.display_name,
                })
            }
            Access::RedirectTo(_) => Err(Error::Unauthenticated { message: None }),
        }
    }
}
