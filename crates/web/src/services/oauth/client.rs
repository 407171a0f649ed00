//! HTTP clients for Google and Facebook.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use stylecore_core::OAuthProvider;

use super::{IdentityProvider, OAuthError, ProviderIdentity};
use crate::config::OAuthClientConfig;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const FACEBOOK_AUTHORIZE_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
const FACEBOOK_PROFILE_URL: &str = "https://graph.facebook.com/v19.0/me";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<FacebookPicture>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

/// Authorization-code client for one provider.
#[derive(Clone)]
pub struct OAuthClient {
    provider: OAuthProvider,
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl OAuthClient {
    #[must_use]
    pub fn new(provider: OAuthProvider, config: &OAuthClientConfig, client: reqwest::Client) -> Self {
        Self {
            provider,
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = match self.provider {
            OAuthProvider::Google => {
                self.client
                    .post(GOOGLE_TOKEN_URL)
                    .form(&params)
                    .send()
                    .await?
            }
            OAuthProvider::Facebook => {
                let url = url::Url::parse_with_params(FACEBOOK_TOKEN_URL, &params)
                    .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;
                self.client.get(url).send().await?
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(format!("{status}: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderIdentity, OAuthError> {
        let request = match self.provider {
            OAuthProvider::Google => self.client.get(GOOGLE_USERINFO_URL),
            OAuthProvider::Facebook => {
                let url = url::Url::parse_with_params(
                    FACEBOOK_PROFILE_URL,
                    &[("fields", "id,name,email,picture.type(large)")],
                )
                .map_err(|e| OAuthError::Profile(e.to_string()))?;
                self.client.get(url)
            }
        };

        let response = request.bearer_auth(access_token).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Profile(format!("{status}: {text}")));
        }

        let identity = match self.provider {
            OAuthProvider::Google => {
                let info: GoogleUserInfo = response.json().await?;
                ProviderIdentity {
                    provider_id: info.sub,
                    email: info.email,
                    name: info.name,
                    avatar: info.picture,
                }
            }
            OAuthProvider::Facebook => {
                let profile: FacebookProfile = response.json().await?;
                ProviderIdentity {
                    provider_id: profile.id,
                    email: profile.email,
                    name: profile.name,
                    avatar: profile.picture.and_then(|p| p.data.url),
                }
            }
        };

        if identity.provider_id.is_empty() {
            return Err(OAuthError::Profile("empty subject id".to_string()));
        }
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn provider(&self) -> OAuthProvider {
        self.provider
    }

    fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let (base, scope) = match self.provider {
            OAuthProvider::Google => (GOOGLE_AUTHORIZE_URL, "openid email profile"),
            OAuthProvider::Facebook => (FACEBOOK_AUTHORIZE_URL, "email,public_profile"),
        };
        format!(
            "{base}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(scope),
            urlencoding::encode(state)
        )
    }

    async fn identity(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderIdentity, OAuthError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        self.fetch_profile(&access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider: OAuthProvider) -> OAuthClient {
        OAuthClient::new(
            provider,
            &OAuthClientConfig {
                client_id: "client-123".to_string(),
                client_secret: SecretString::from("shh"),
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn google_authorization_url_carries_state_and_redirect() {
        let url = client(OAuthProvider::Google).authorization_url(
            "http://acme-salon.localhost/auth/google/callback",
            "abc123",
        );
        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Facme-salon.localhost%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn facebook_authorization_url_requests_email() {
        let url = client(OAuthProvider::Facebook).authorization_url("http://x/cb", "s");
        assert!(url.starts_with(FACEBOOK_AUTHORIZE_URL));
        assert!(url.contains("scope=email%2Cpublic_profile"));
    }

    #[test]
    fn facebook_profile_picture_is_nested() {
        let profile: FacebookProfile = serde_json::from_str(
            r#"{"id":"99","name":"Ana","picture":{"data":{"url":"https://fb/pic.jpg"}}}"#,
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(profile.id, "99");
        assert!(profile.email.is_none());
        assert_eq!(
            profile.picture.and_then(|p| p.data.url).as_deref(),
            Some("https://fb/pic.jpg")
        );
    }
}
