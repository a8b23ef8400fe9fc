use argon2::Argon2;
use password_hash::{PasswordHash, PasswordVerifier, SaltString};

use crate::error::AppResult;

pub fn hash_password(password: impl AsRef<[u8]>) -> AppResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    let hash = PasswordHash::generate(Argon2::default(), password.as_ref(), &salt)
        .map_err(|err| anyhow::anyhow!(err))?
        .to_string();
    Ok(hash)
}

/// Returns `Ok(false)` for a wrong password; errors only when the stored hash is unreadable.
pub fn verify_password(hash: &str, password: impl AsRef<[u8]>) -> AppResult<bool> {
    let hash = PasswordHash::new(hash).map_err(|err| anyhow::anyhow!(err))?;

    match Argon2::default().verify_password(password.as_ref(), &hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow::anyhow!(err).into()),
    }
}
