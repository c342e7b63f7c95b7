//! Session lifecycle and the signed cookie that carries the token.
//!
//! A session is an opaque, unguessable token mapped to an account id in an
//! in-process store. Tokens are minted fresh on every successful login (a
//! prior token for the same account is never reused or extended) and die on
//! logout or expiry. The browser never sees anything but the token: the
//! cookie value is `{token}.{base64url(hmac_sha256(secret_key, token))}`,
//! so a value that was not minted by this server fails verification before
//! the store is ever consulted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SessionConfig;
use crate::errors::Error;
use crate::types::AccountId;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of resolving a token against the session store.
///
/// Missing, expired, and forged tokens are all `Anonymous` - not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(AccountId),
    Anonymous,
}

struct Session {
    account_id: AccountId,
    expires_at: Instant,
}

/// Maps authenticated identities to opaque session tokens and back.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Bind a fresh token to this account.
    pub fn establish(&self, account_id: AccountId) -> String {
        let token = generate_token();
        self.sessions.insert(
            token.clone(),
            Session {
                account_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Look a token up; expired entries are dropped on the way out.
    pub fn resolve(&self, token: &str) -> Resolution {
        let expired = match self.sessions.get(token) {
            Some(session) if Instant::now() < session.expires_at => {
                return Resolution::Authenticated(session.account_id);
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        Resolution::Anonymous
    }

    /// Idempotent: destroying an unknown or already-destroyed token is a no-op.
    pub fn destroy(&self, token: &str) {
        self.sessions.remove(token);
    }
}

/// Generate a session token with 256 bits of entropy, base64url without padding.
fn generate_token() -> String {
    use rand::RngCore;

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);

    URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Sign a token for cookie transport: `{token}.{base64url-hmac-sha256}`.
pub fn sign_token(token: &str, secret_key: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("create session signer: {e}"),
    })?;
    mac.update(token.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{token}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Recover the token from a cookie value, rejecting anything whose signature
/// does not verify. Comparison is constant-time (`Mac::verify_slice`).
pub fn verify_cookie_value<'a>(value: &'a str, secret_key: &str) -> Option<&'a str> {
    let (token, signature) = value.rsplit_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).ok()?;
    mac.update(token.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(token)
}

/// Pull the verified session token out of a request's Cookie header.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str, secret_key: &str) -> Option<String> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name == cookie_name {
                if let Some(token) = verify_cookie_value(value, secret_key) {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Build the Set-Cookie value for a freshly signed session.
pub fn session_cookie(signed_value: &str, config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        config.cookie_name,
        signed_value,
        config.cookie_same_site,
        config.timeout.as_secs()
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        config.cookie_name, config.cookie_same_site
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}
