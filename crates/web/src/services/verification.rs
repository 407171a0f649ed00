//! Signed email verification links.
//!
//! A link carries the user id and an HMAC-SHA256 signature over
//! `tenant_id|user_id|email`, keyed by the application key. Changing the email
//! or presenting the link on another tenant's host invalidates it.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use stylecore_core::{Email, TenantId, UserId};

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// Errors from checking a verification link.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// The signature is not hex or does not match.
    #[error("invalid verification signature")]
    InvalidSignature,

    /// The key was rejected by the MAC.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Signs and checks verification links.
///
/// Holds a keyed MAC that is cloned per signature.
#[derive(Clone)]
pub struct VerificationSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for VerificationSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl VerificationSigner {
    /// Key a signer with the application key.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::InvalidKey` if the MAC rejects the key.
    pub fn new(key: &SecretString) -> Result<Self, VerificationError> {
        let keyed = HmacSha256::new_from_slice(key.expose_secret().as_bytes())
            .map_err(|_| VerificationError::InvalidKey)?;
        Ok(Self { keyed })
    }

    fn mac(&self, tenant_id: &TenantId, user_id: UserId, email: &Email) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(tenant_id.as_str().as_bytes());
        mac.update(b"|");
        mac.update(user_id.to_string().as_bytes());
        mac.update(b"|");
        mac.update(email.as_str().as_bytes());
        mac
    }

    /// Hex-encoded signature for a user.
    #[must_use]
    pub fn sign(&self, user: &User) -> String {
        hex::encode(
            self.mac(&user.tenant_id, user.id, &user.email)
                .finalize()
                .into_bytes(),
        )
    }

    /// Check a signature in constant time.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::InvalidSignature` on any mismatch.
    pub fn verify(&self, user: &User, signature: &str) -> Result<(), VerificationError> {
        let bytes = hex::decode(signature).map_err(|_| VerificationError::InvalidSignature)?;
        self.mac(&user.tenant_id, user.id, &user.email)
            .verify_slice(&bytes)
            .map_err(|_| VerificationError::InvalidSignature)
    }

    /// Absolute verification URL under `origin` (e.g. `http://acme-salon.localhost`).
    #[must_use]
    pub fn url(&self, origin: &str, user: &User) -> String {
        format!(
            "{}/email/verify/{}/{}",
            origin.trim_end_matches('/'),
            user.id,
            self.sign(user)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use stylecore_core::{UserRole, UserStatus, UserType};

    use super::*;

    fn user(tenant: &str, email: &str) -> User {
        User {
            id: UserId::new(7),
            tenant_id: TenantId::new(tenant),
            name: "Ana".to_string(),
            username: "ana".to_string(),
            email: Email::parse(email).unwrap(),
            phone: None,
            role: UserRole::Customer,
            user_type: UserType::Client,
            status: UserStatus::Pending,
            email_verified_at: None,
            google_id: None,
            facebook_id: None,
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn signer() -> VerificationSigner {
        VerificationSigner::new(&SecretString::from("k9Qz2LmX7vPw4RtY8bNc3HsJ6dFg1AeU")).unwrap()
    }

    #[test]
    fn signature_round_trips() {
        let ana = user("acme-salon", "ana@mail.com");
        let signature = signer().sign(&ana);
        assert_eq!(signature.len(), 64);
        assert_eq!(signer().verify(&ana, &signature), Ok(()));
    }

    #[test]
    fn signature_is_bound_to_tenant_and_email() {
        let ana = user("acme-salon", "ana@mail.com");
        let signature = signer().sign(&ana);

        let elsewhere = user("other-salon", "ana@mail.com");
        assert_eq!(
            signer().verify(&elsewhere, &signature),
            Err(VerificationError::InvalidSignature)
        );

        let changed = user("acme-salon", "ana2@mail.com");
        assert!(signer().verify(&changed, &signature).is_err());
    }

    #[test]
    fn garbage_signature_is_rejected() {
        let ana = user("acme-salon", "ana@mail.com");
        assert!(signer().verify(&ana, "not-hex").is_err());
        assert!(signer().verify(&ana, "abcd").is_err());
    }

    #[test]
    fn url_contains_id_and_signature() {
        let ana = user("acme-salon", "ana@mail.com");
        let url = signer().url("http://acme-salon.localhost/", &ana);
        assert!(url.starts_with("http://acme-salon.localhost/email/verify/7/"));
    }
}
