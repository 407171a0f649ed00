//! Outgoing email.
//!
//! [`SmtpMailer`] delivers through an SMTP relay via lettre. Without SMTP
//! configuration [`LogMailer`] writes each message to the log, which is enough
//! to click verification links during development.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use stylecore_core::Email;

use crate::config::EmailConfig;
use crate::i18n::{Locale, Message as Text};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Email,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivery backend for transactional email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// HTML body of the verification email.
#[derive(Template)]
#[template(path = "email/verify.html")]
struct VerifyEmailHtml<'a> {
    lang: &'a str,
    greeting: &'a str,
    name: &'a str,
    body: &'a str,
    action: &'a str,
    url: &'a str,
}

/// Plain text body of the verification email.
#[derive(Template)]
#[template(path = "email/verify.txt")]
struct VerifyEmailText<'a> {
    greeting: &'a str,
    name: &'a str,
    body: &'a str,
    url: &'a str,
}

/// Render the verification email for `to`.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn verification_email(
    locale: Locale,
    to: &Email,
    name: &str,
    url: &str,
) -> Result<OutgoingEmail, EmailError> {
    let greeting = locale.text(Text::VerifyEmailGreeting);
    let body = locale.text(Text::VerifyEmailBody);

    let html_body = VerifyEmailHtml {
        lang: locale.tag(),
        greeting,
        name,
        body,
        action: locale.text(Text::VerifyEmailAction),
        url,
    }
    .render()?;
    let text_body = VerifyEmailText {
        greeting,
        name,
        body,
        url,
    }
    .render()?;

    Ok(OutgoingEmail {
        to: to.clone(),
        subject: locale.text(Text::VerifyEmailSubject).to_owned(),
        text_body,
        html_body,
    })
}

/// SMTP delivery.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Build a mailer from configuration, or `None` when no SMTP host is set.
    ///
    /// # Errors
    ///
    /// Returns error if the relay address is invalid.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, SmtpError> {
        let Some(smtp) = &config.smtp else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Some(Self {
            mailer: builder.build(),
            from_address: config.from_address.clone(),
        }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.to_string()))?)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text_body,
            "SMTP not configured, logging email instead of sending"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_contains_link_in_both_bodies() {
        let to = Email::parse("ana@mail.com").unwrap();
        let url = "http://acme-salon.localhost/email/verify/1/abc";
        let email = verification_email(Locale::En, &to, "Ana", url).unwrap();

        assert_eq!(email.subject, "Verify your email address");
        assert!(email.text_body.contains(url));
        assert!(email.html_body.contains(url));
        assert!(email.html_body.contains("Ana"));
    }

    #[test]
    fn verification_email_is_localized() {
        let to = Email::parse("ana@mail.com").unwrap();
        let email = verification_email(Locale::PtBr, &to, "Ana", "http://x/y").unwrap();
        assert_eq!(email.subject, "Verifique seu endereço de e-mail");
        assert!(email.text_body.starts_with("Olá"));
    }
}
