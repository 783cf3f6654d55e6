use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::warn;

use crate::error::RemoteError;

const SALT_LEN: usize = 16;

/// Hashes `password` into an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, RemoteError> {
    if password.is_empty() {
        return Err(RemoteError::Credentials {
            error: "password must not be empty".into(),
        });
    }

    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt).map_err(|e| RemoteError::Credentials {
        error: e.to_string(),
    })?;
    let salt = SaltString::encode_b64(&salt)?;

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for stored values that are not PHC hashes.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored credential is not a password hash ({e}), rejecting login");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [hash_password] on the blocking pool.
pub(crate) async fn hash_password_off_thread(password: String) -> Result<String, RemoteError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RemoteError::Credentials {
            error: e.to_string(),
        })?
}

/// [verify_password] on the blocking pool. A panicked check is a rejection.
pub(crate) async fn verify_password_off_thread(password: String, stored: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or_else(|e| {
            warn!("Password check did not complete: {e}");
            false
        })
}
