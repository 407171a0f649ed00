//! Social login providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A provider name that is not on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported OAuth provider: {0}")]
pub struct UnsupportedProvider(pub String);

/// OAuth identity providers users may sign in with.
///
/// Parsing is the allow-list: any other `{provider}` path segment fails to
/// parse and the route answers 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    /// All supported providers.
    pub const ALL: [Self; 2] = [Self::Google, Self::Facebook];

    /// The URL segment for this provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }

    /// The `users` column holding this provider's subject id.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Google => "google_id",
            Self::Facebook => "facebook_id",
        }
    }

    /// Human-readable name for buttons and messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Facebook => "Facebook",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = UnsupportedProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            other => Err(UnsupportedProvider(other.to_owned())),
        }
    }
}
