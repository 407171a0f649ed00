//! Password authentication and credential helpers.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use stylecore_core::{Email, TenantScope};

use crate::db::Datastore;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of the random secret behind an unusable password.
const UNUSABLE_PASSWORD_LENGTH: usize = 32;

/// Argon2id hash (default parameters) that no password matches. Verified
/// against when the account does not exist so the response takes as long as
/// a wrong password.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c3R5bGVjb3JlLWR1bW15IQ$EkK8gtcALnkDJJJ/h3kNu6w+qO+5AXEz2P/EYiYtpA4";

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Datastore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Datastore) -> Self {
        Self { store }
    }

    /// Login with email and password within a tenant.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDisabled` if the account is inactive or suspended.
    pub async fn login_with_password(
        &self,
        scope: &TenantScope,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = self.store.find_user_by_email(scope, &email).await? else {
            return Err(reject_unknown(password));
        };
        let Some(password_hash) = self.store.password_hash(scope, user.id).await? else {
            return Err(reject_unknown(password));
        };

        verify_password(password, &password_hash)?;

        if !user.status.can_sign_in() {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }
}

/// Burn one verification's worth of work, then refuse.
fn reject_unknown(password: &str) -> AuthError {
    verify_password(password, DUMMY_PASSWORD_HASH)
        .err()
        .unwrap_or(AuthError::InvalidCredentials)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Hash of a random secret nobody knows, for accounts created through OAuth.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn unusable_password_hash() -> Result<String, AuthError> {
    hash_password(&generate_random_string(UNUSABLE_PASSWORD_LENGTH))
}

/// Generate a cryptographically secure random alphanumeric string.
#[must_use]
pub fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET.get(idx).copied().map_or('0', char::from)
        })
        .collect()
}
