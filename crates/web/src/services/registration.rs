//! User registration.
//!
//! Input is normalized (trimmed, username and email lowercased) before it is
//! validated, so the stored values are exactly the ones that were checked.
//! Every field error is collected before returning; nothing is written unless
//! all of them pass.

use std::borrow::Cow;

use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidateEmail, ValidationError};

use stylecore_core::{Email, RegisterAs, TenantScope, UserStatus};

use super::auth::{AuthError, MIN_PASSWORD_LENGTH, hash_password};
use super::events::{DomainEvent, EventDispatcher};
use crate::db::{Datastore, RepositoryError};
use crate::error::FieldErrors;
use crate::models::{NewUser, User};

const MAX_NAME_LENGTH: usize = 255;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MAX_PASSWORD_LENGTH: usize = 255;

const EMAIL_TAKEN: &str = "The email has already been taken.";
const USERNAME_TAKEN: &str = "The username has already been taken.";

/// Errors from registering a user.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// One or more fields failed validation.
    #[error("registration invalid: {0}")]
    Invalid(FieldErrors),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}

impl From<AuthError> for RegistrationError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(err) => Self::Repository(err),
            _ => Self::PasswordHash,
        }
    }
}

/// Sign-up form as submitted.
///
/// Missing fields deserialize as empty so they surface as "required" errors
/// instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(custom(function = "validate_email"))]
    pub email: String,

    #[validate(
        custom(function = "validate_password"),
        must_match(
            other = "password_confirmation",
            message = "The password confirmation does not match."
        )
    )]
    pub password: String,

    pub password_confirmation: String,

    #[validate(length(max = 32, message = "The phone may not be greater than 32 characters."))]
    pub phone: Option<String>,

    pub register_as: Option<String>,
}

impl RegistrationForm {
    /// Trim every field and lowercase the identifiers.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            username: self.username.trim().to_lowercase(),
            email: self.email.trim().to_lowercase(),
            phone: self
                .phone
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
            ..self
        }
    }

    /// Same form with the secrets blanked, for re-rendering after a failure.
    #[must_use]
    pub fn without_passwords(&self) -> Self {
        Self {
            password: String::new(),
            password_confirmation: String::new(),
            ..self.clone()
        }
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(invalid("required", "The name field is required."));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(invalid(
            "max",
            "The name may not be greater than 255 characters.",
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(invalid("required", "The username field is required."));
    }
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(invalid(
            "length",
            "The username must be between 3 and 50 characters.",
        ));
    }
    if !username.chars().all(is_username_char) {
        return Err(invalid(
            "format",
            "The username may only contain letters, numbers, dots, dashes and underscores.",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(invalid("required", "The email field is required."));
    }
    if email.len() > Email::MAX_LENGTH {
        return Err(invalid(
            "max",
            "The email may not be greater than 254 characters.",
        ));
    }
    if !email.validate_email() {
        return Err(invalid("email", "The email must be a valid email address."));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(invalid("min", "The password must be at least 8 characters."));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(invalid(
            "max",
            "The password may not be greater than 255 characters.",
        ));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(invalid(
            "strength",
            "The password must contain at least one letter and one number.",
        ));
    }
    Ok(())
}

/// Characters allowed in a (lowercased) username.
#[must_use]
pub const fn is_username_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

/// Registration service.
pub struct RegistrationService<'a> {
    store: &'a dyn Datastore,
    events: &'a EventDispatcher,
}

impl<'a> RegistrationService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Datastore, events: &'a EventDispatcher) -> Self {
        Self { store, events }
    }

    /// Validate the form, create a pending user and dispatch `Registered`.
    ///
    /// `origin` is the scheme and host the request arrived on; listeners use
    /// it to build links back to the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Invalid` with every failing field, including
    /// uniqueness conflicts detected by the store.
    pub async fn register(
        &self,
        scope: &TenantScope,
        form: RegistrationForm,
        origin: &str,
    ) -> Result<User, RegistrationError> {
        let form = form.normalized();

        let mut errors = form
            .validate()
            .map_or_else(FieldErrors::from, |()| FieldErrors::new());

        let email = match Email::parse(&form.email) {
            Ok(email) => Some(email),
            Err(_) => {
                if !errors.contains("email") {
                    errors.add("email", "The email must be a valid email address.");
                }
                None
            }
        };

        if !errors.contains("username") && self.store.username_exists(&form.username).await? {
            errors.add("username", USERNAME_TAKEN);
        }
        if let Some(email) = &email
            && !errors.contains("email")
            && self.store.find_user_by_email(scope, email).await?.is_some()
        {
            errors.add("email", EMAIL_TAKEN);
        }

        let Some(email) = email.filter(|_| errors.is_empty()) else {
            tracing::debug!(fields = %errors, "Registration rejected");
            return Err(RegistrationError::Invalid(errors));
        };

        let (role, user_type) = RegisterAs::from_intent(form.register_as.as_deref()).classify();
        let new_user = NewUser {
            tenant_id: None,
            name: form.name,
            username: form.username,
            email,
            phone: form.phone,
            role,
            user_type,
            status: UserStatus::Pending,
            email_verified_at: None,
            google_id: None,
            facebook_id: None,
            avatar: None,
            password_hash: hash_password(&form.password)?,
        };

        let user = match self.store.create_user(scope, new_user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict(field)) if field == "email" => {
                return Err(RegistrationError::Invalid(FieldErrors::single(
                    "email",
                    EMAIL_TAKEN,
                )));
            }
            Err(RepositoryError::Conflict(field)) if field == "username" => {
                return Err(RegistrationError::Invalid(FieldErrors::single(
                    "username",
                    USERNAME_TAKEN,
                )));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            role = %user.role,
            "User registered"
        );

        self.events
            .dispatch(DomainEvent::Registered {
                user: user.clone(),
                origin: origin.to_owned(),
            })
            .await;

        Ok(user)
    }
}
