//! Local username/password registration and login.

use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    auth::password,
    config::PasswordConfig,
    db::{
        handlers::{Accounts, Repository},
        models::accounts::{AccountCreateDBRequest, AccountDBResponse},
    },
    errors::Error,
};

/// Register a new local account.
///
/// The username's uniqueness is decided by the insert itself; a duplicate
/// surfaces as a `UniqueViolation` and is propagated unchanged. The caller
/// is responsible for establishing a session afterwards.
#[instrument(skip_all, fields(username = %username))]
pub async fn register(
    conn: &mut SqliteConnection,
    config: &PasswordConfig,
    username: &str,
    password: &str,
) -> Result<AccountDBResponse, Error> {
    if username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username must not be empty".to_string(),
        });
    }
    if password.is_empty() {
        return Err(Error::Validation {
            message: "Password must not be empty".to_string(),
        });
    }
    if password.len() < config.min_length {
        return Err(Error::Validation {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if password.len() > config.max_length {
        return Err(Error::Validation {
            message: format!("Password must be no more than {} characters", config.max_length),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password_hash = tokio::task::spawn_blocking({
        let password = password.to_string();
        let config = config.clone();
        move || password::hash_password(&password, &config)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let account = Accounts::new(conn)
        .create(&AccountCreateDBRequest::local(username, password_hash))
        .await?;

    Ok(account)
}

/// Authenticate a local account.
///
/// Unknown username, an account with no local credential (federation-only),
/// and a failed verification all collapse into the same `InvalidCredentials`
/// so a caller cannot probe which usernames exist. Nothing here touches the
/// session store - credentials are fully verified before any session exists.
#[instrument(skip_all, fields(username = %username))]
pub async fn login(conn: &mut SqliteConnection, username: &str, password: &str) -> Result<AccountDBResponse, Error> {
    let account = Accounts::new(conn)
        .find_by_username(username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    let password_hash = account.password_hash.clone().ok_or(Error::InvalidCredentials)?;

    // Verify on a blocking thread to avoid blocking the async runtime
    let is_valid = tokio::task::spawn_blocking({
        let password = password.to_string();
        move || password::verify_password(&password, &password_hash)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password verification task: {e}"),
    })??;

    if !is_valid {
        return Err(Error::InvalidCredentials);
    }

    Ok(account)
}
