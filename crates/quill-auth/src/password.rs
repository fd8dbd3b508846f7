//! Password hashing and verification (Argon2id).
//!
//! Hashes are stored as PHC-format strings (e.g.
//! `$argon2id$v=19$m=19456,t=2,p=1$...`) in the `password` column of the
//! `users` table. Verification parses the stored string and re-derives the
//! hash; plaintext never touches the database.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hashes a password with a freshly generated random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks a submitted password against a stored PHC-format hash.
///
/// Returns `Ok(false)` on a mismatch. An `Err` means the stored hash itself
/// is malformed, which indicates data corruption rather than a bad login.
pub fn verify_password(
    password: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}
