//! User-facing messages in the supported locales.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Locales the application ships translations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

impl Locale {
    /// BCP 47 tag, as used in `<html lang>`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::PtBr => "pt-BR",
        }
    }

    /// Translate a message.
    #[must_use]
    pub const fn text(self, message: Message) -> &'static str {
        match self {
            Self::En => english(message),
            Self::PtBr => portuguese(message),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" => Ok(Self::En),
            "pt-br" | "pt" => Ok(Self::PtBr),
            other => Err(format!("unsupported locale '{other}' (expected en or pt-BR)")),
        }
    }
}

/// Every translatable flash message and email line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    OAuthFailed,
    OAuthDenied,
    OAuthStateMismatch,
    OAuthMissingEmail,
    InvalidCredentials,
    AccountDisabled,
    LoggedOut,
    EmailVerified,
    VerificationLinkSent,
    VerifyEmailSubject,
    VerifyEmailGreeting,
    VerifyEmailBody,
    VerifyEmailAction,
}

const fn english(message: Message) -> &'static str {
    match message {
        Message::OAuthFailed => "We could not sign you in with that provider. Please try again.",
        Message::OAuthDenied => "Sign-in was cancelled at the provider.",
        Message::OAuthStateMismatch => "Your sign-in session expired. Please try again.",
        Message::OAuthMissingEmail => {
            "The provider did not share an email address, so we could not create your account."
        }
        Message::InvalidCredentials => "These credentials do not match our records.",
        Message::AccountDisabled => "This account has been disabled.",
        Message::LoggedOut => "You have been signed out.",
        Message::EmailVerified => "Your email address has been verified.",
        Message::VerificationLinkSent => {
            "A new verification link has been sent to your email address."
        }
        Message::VerifyEmailSubject => "Verify your email address",
        Message::VerifyEmailGreeting => "Hello",
        Message::VerifyEmailBody => {
            "Please click the button below to verify your email address."
        }
        Message::VerifyEmailAction => "Verify email address",
    }
}

const fn portuguese(message: Message) -> &'static str {
    match message {
        Message::OAuthFailed => {
            "Não foi possível entrar com esse provedor. Por favor, tente novamente."
        }
        Message::OAuthDenied => "O acesso foi cancelado no provedor.",
        Message::OAuthStateMismatch => "Sua sessão de login expirou. Por favor, tente novamente.",
        Message::OAuthMissingEmail => {
            "O provedor não compartilhou um endereço de e-mail, então não foi possível criar sua conta."
        }
        Message::InvalidCredentials => "Essas credenciais não correspondem aos nossos registros.",
        Message::AccountDisabled => "Esta conta foi desativada.",
        Message::LoggedOut => "Você saiu da sua conta.",
        Message::EmailVerified => "Seu endereço de e-mail foi verificado.",
        Message::VerificationLinkSent => {
            "Um novo link de verificação foi enviado para o seu endereço de e-mail."
        }
        Message::VerifyEmailSubject => "Verifique seu endereço de e-mail",
        Message::VerifyEmailGreeting => "Olá",
        Message::VerifyEmailBody => {
            "Clique no botão abaixo para verificar seu endereço de e-mail."
        }
        Message::VerifyEmailAction => "Verificar endereço de e-mail",
    }
}
