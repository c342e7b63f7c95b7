//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::PasswordConfig;
use crate::errors::Error;

/// Create an Argon2id instance from the configured parameters.
fn to_argon2(config: &PasswordConfig) -> Result<Argon2<'static>, Error> {
    let params = Params::new(config.argon2_memory_kib, config.argon2_iterations, config.argon2_parallelism, None)
        .map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with a salt drawn fresh from the OS CSPRNG.
///
/// The salt and parameters travel inside the returned PHC string.
pub fn hash_password(plain: &str, config: &PasswordConfig) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = to_argon2(config)?;

    let hash = argon2.hash_password(plain.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash password: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a password against a PHC hash string.
///
/// Comparison happens inside `verify_password`, which recomputes the digest
/// with the parameters embedded in the hash and compares in constant time.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse password hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed_hash).is_ok())
}
