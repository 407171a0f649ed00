//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STYLECORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STYLECORE_BASE_URL` - Public URL of the platform; its scheme is reused for tenant hosts
//! - `STYLECORE_APP_KEY` - Key signing email verification links (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STYLECORE_HOST` - Bind address (default: 127.0.0.1)
//! - `STYLECORE_PORT` - Listen port (default: 8000)
//! - `STYLECORE_LOCALE` - `en` or `pt-BR` (default: en)
//! - `REQUIRE_EMAIL_VERIFICATION` - Send verification links on sign-up (default: true)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Enable Google sign-in
//! - `FACEBOOK_CLIENT_ID` / `FACEBOOK_CLIENT_SECRET` - Enable Facebook sign-in
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD` - Outgoing mail relay
//! - `EMAIL_FROM` - Sender address (default: `StyleCore <no-reply@stylecore.local>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use stylecore_core::OAuthProvider;

use crate::i18n::Locale;

const MIN_APP_KEY_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SMTP_PORT: &str = "587";
const DEFAULT_EMAIL_FROM: &str = "StyleCore <no-reply@stylecore.local>";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// StyleCore web application configuration.
#[derive(Debug, Clone)]
pub struct StyleCoreConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the platform
    pub base_url: String,
    /// Key for signing verification links
    pub app_key: SecretString,
    /// Language for flash messages and emails
    pub locale: Locale,
    /// Whether new registrations must verify their email
    pub require_email_verification: bool,
    /// Google OAuth client, when configured
    pub google: Option<OAuthClientConfig>,
    /// Facebook OAuth client, when configured
    pub facebook: Option<OAuthClientConfig>,
    /// Outgoing mail settings
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// OAuth client credentials for one provider.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Outgoing email configuration.
///
/// Without an SMTP host, mail is written to the log instead of sent.
#[derive(Clone)]
pub struct EmailConfig {
    pub from_address: String,
    pub smtp: Option<SmtpConfig>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_address", &self.from_address)
            .field("smtp", &self.smtp)
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StyleCoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STYLECORE_DATABASE_URL")?;
        let host = get_env_or_default("STYLECORE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STYLECORE_HOST".to_string(), e.to_string()))?;
        let port = parse_port("STYLECORE_PORT", &get_env_or_default("STYLECORE_PORT", "8000"))?;
        let base_url = get_required_env("STYLECORE_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STYLECORE_BASE_URL".to_string(), e.to_string())
        })?;

        let app_key = get_validated_secret("STYLECORE_APP_KEY")?;
        validate_key_length(&app_key, "STYLECORE_APP_KEY")?;

        let locale = get_env_or_default("STYLECORE_LOCALE", "en")
            .parse::<Locale>()
            .map_err(|e| ConfigError::InvalidEnvVar("STYLECORE_LOCALE".to_string(), e))?;
        let require_email_verification = parse_bool(
            "REQUIRE_EMAIL_VERIFICATION",
            &get_env_or_default("REQUIRE_EMAIL_VERIFICATION", "true"),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            app_key,
            locale,
            require_email_verification,
            google: OAuthClientConfig::from_env("GOOGLE")?,
            facebook: OAuthClientConfig::from_env("FACEBOOK")?,
            email: EmailConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// URL scheme used when building links for tenant hosts.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.is_secure() { "https" } else { "http" }
    }

    /// Client credentials for `provider`, if that provider is enabled.
    #[must_use]
    pub const fn oauth_client(&self, provider: OAuthProvider) -> Option<&OAuthClientConfig> {
        match provider {
            OAuthProvider::Google => self.google.as_ref(),
            OAuthProvider::Facebook => self.facebook.as_ref(),
        }
    }
}

impl OAuthClientConfig {
    /// Read `{PREFIX}_CLIENT_ID` and `{PREFIX}_CLIENT_SECRET`.
    ///
    /// Both unset disables the provider; only one set is a configuration error.
    fn from_env(prefix: &str) -> Result<Option<Self>, ConfigError> {
        let id_key = format!("{prefix}_CLIENT_ID");
        let secret_key = format!("{prefix}_CLIENT_SECRET");

        match (get_optional_env(&id_key), get_optional_env(&secret_key)) {
            (None, None) => Ok(None),
            (Some(client_id), Some(secret)) => Ok(Some(Self {
                client_id,
                client_secret: SecretString::from(secret),
            })),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(secret_key)),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(id_key)),
        }
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let from_address = get_env_or_default("EMAIL_FROM", DEFAULT_EMAIL_FROM);

        let smtp = match get_optional_env("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_port("SMTP_PORT", &get_env_or_default("SMTP_PORT", DEFAULT_SMTP_PORT))?,
                username: get_optional_env("SMTP_USERNAME"),
                password: get_optional_env("SMTP_PASSWORD").map(SecretString::from),
            }),
            None => None,
        };

        Ok(Self { from_address, smtp })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag the way `.env` files usually spell them.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Validate that a signing key meets minimum length requirements.
fn validate_key_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_APP_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_APP_KEY_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
