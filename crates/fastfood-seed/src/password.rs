//! Argon2id password hashing for seeded accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{SeedError, SeedResult};

const SALT_SIZE: usize = 16;

/// Hash `password` into a PHC string with a random salt.
pub fn hash_password(password: &str) -> SeedResult<String> {
    let salt_bytes: [u8; SALT_SIZE] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| SeedError::Hash(format!("salt encoding: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SeedError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
