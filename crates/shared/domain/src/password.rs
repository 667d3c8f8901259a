//! Password value object.
//!
//! Plaintext is checked for strength, hashed with Argon2 and dropped; only
//! the PHC hash string is ever retained.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Hashed password.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Check strength, then hash.
    ///
    /// # Errors
    /// `WeakPassword` when the plaintext fails [`check_strength`], or
    /// `PasswordHash` if the hasher itself fails.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        check_strength(plain_text)?;
        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Wrap a hash loaded from storage.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// True when `plain_text` matches. A malformed stored hash never matches.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn hash(plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

/// Length 8-128 with at least one uppercase, lowercase, digit and symbol.
pub fn check_strength(plain_text: &str) -> DomainResult<()> {
    let len = plain_text.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(DomainError::weak_password(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(DomainError::weak_password(format!(
            "password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_symbol = false;
    for c in plain_text.chars() {
        if c.is_uppercase() {
            has_upper = true;
        } else if c.is_lowercase() {
            has_lower = true;
        } else if c.is_numeric() {
            has_digit = true;
        } else if !c.is_whitespace() && !c.is_alphanumeric() {
            has_symbol = true;
        }
    }

    let missing = [
        (has_upper, "one uppercase letter"),
        (has_lower, "one lowercase letter"),
        (has_digit, "one digit"),
        (has_symbol, "one special character"),
    ];
    if let Some((_, what)) = missing.iter().find(|(present, _)| !present) {
        return Err(DomainError::weak_password(format!(
            "password must contain at least {what}"
        )));
    }
    Ok(())
}
