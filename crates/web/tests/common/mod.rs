//! Shared harness for router tests.
//!
//! Every test app runs on an in-memory datastore and session store with two
//! tenants: `acme-salon.localhost` and `bella.localhost`. Mail is recorded
//! instead of sent, and Google sign-in goes through a stub provider.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use secrecy::SecretString;
use tower::ServiceExt;

use stylecore_core::{Email, OAuthProvider, TenantBlueprint};
use stylecore_web::config::{EmailConfig, StyleCoreConfig};
use stylecore_web::db::{Datastore, MemoryStore, TenantStore, UserStore};
use stylecore_web::i18n::Locale;
use stylecore_web::middleware::create_session_layer;
use stylecore_web::models::{Tenant, User};
use stylecore_web::services::email::{EmailError, Mailer, OutgoingEmail};
use stylecore_web::services::oauth::{IdentityProvider, OAuthError, ProviderIdentity};
use stylecore_web::state::AppState;

pub const ACME: &str = "acme-salon.localhost";
pub const BELLA: &str = "bella.localhost";
pub const APP_KEY: &str = "x7Qp2LmZ9vRt4KwN8bYc3HdF6sJg1AeU";

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().push(email);
        Ok(())
    }
}

/// Google stand-in returning whatever identity the test configured.
///
/// The code `bad` fails the token exchange.
pub struct StubProvider {
    identity: Mutex<ProviderIdentity>,
}

impl StubProvider {
    pub fn set_identity(&self, identity: ProviderIdentity) {
        *self.identity.lock() = identity;
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn provider(&self) -> OAuthProvider {
        OAuthProvider::Google
    }

    fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        url::Url::parse_with_params(
            "https://accounts.provider.test/authorize",
            &[("redirect_uri", redirect_uri), ("state", state)],
        )
        .unwrap()
        .to_string()
    }

    async fn identity(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<ProviderIdentity, OAuthError> {
        if code == "bad" {
            return Err(OAuthError::TokenExchange("invalid_grant".to_owned()));
        }
        Ok(self.identity.lock().clone())
    }
}

pub fn identity(provider_id: &str, email: Option<&str>) -> ProviderIdentity {
    ProviderIdentity {
        provider_id: provider_id.to_owned(),
        email: email.map(str::to_owned),
        name: Some("Nina Costa".to_owned()),
        avatar: Some("https://lh3.googleusercontent.com/a/nina".to_owned()),
    }
}

pub fn config(require_email_verification: bool) -> StyleCoreConfig {
    StyleCoreConfig {
        database_url: SecretString::from("postgres://unused".to_owned()),
        host: "127.0.0.1".parse().unwrap(),
        port: 8000,
        base_url: "http://localhost:8000".to_owned(),
        app_key: SecretString::from(APP_KEY.to_owned()),
        locale: Locale::En,
        require_email_verification,
        google: None,
        facebook: None,
        email: EmailConfig {
            from_address: "no-reply@stylecore.test".to_owned(),
            smtp: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub google: Arc<StubProvider>,
    pub acme: Tenant,
    pub bella: Tenant,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_verification(true).await
    }

    pub async fn with_verification(required: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (acme, _) = store
            .create_tenant(&TenantBlueprint::new("Acme Salon", None).unwrap())
            .await
            .unwrap();
        let (bella, _) = store
            .create_tenant(&TenantBlueprint::new("Bella", None).unwrap())
            .await
            .unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let google = Arc::new(StubProvider {
            identity: Mutex::new(identity("google-1", Some("nina@example.com"))),
        });

        let config = config(required);
        let sessions = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn Datastore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            vec![Arc::clone(&google) as Arc<dyn IdentityProvider>],
        )
        .unwrap();

        Self {
            router: stylecore_web::app(state, sessions),
            store,
            mailer,
            google,
            acme,
            bella,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, host: &str, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(path).header(header::HOST, host);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        host: &str,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::post(path)
            .header(header::HOST, host)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_json(
        &self,
        host: &str,
        path: &str,
        json: &serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::post(path)
            .header(header::HOST, host)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(json.to_string())).unwrap())
            .await
    }

    /// Register through the form and return the session cookie.
    pub async fn register(
        &self,
        host: &str,
        username: &str,
        email: &str,
        register_as: Option<&str>,
    ) -> (StatusCode, Option<String>) {
        let mut fields = vec![
            ("name", "Test Person"),
            ("username", username),
            ("email", email),
            ("password", "secret123"),
            ("password_confirmation", "secret123"),
        ];
        if let Some(register_as) = register_as {
            fields.push(("register_as", register_as));
        }
        let response = self.post_form(host, "/register", &fields, None).await;
        (response.status(), session_cookie(&response))
    }

    /// Run the full social sign-in round trip for Google on `host`.
    pub async fn google_login(&self, host: &str, code: &str) -> Response<Body> {
        let start = self.get(host, "/auth/google/redirect", None).await;
        assert_eq!(start.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&start).expect("state must be stored in the session");
        let state = query_param(location(&start), "state").expect("state in authorization url");

        let path = format!("/auth/google/callback?code={code}&state={state}");
        self.get(host, &path, Some(&cookie)).await
    }

    pub async fn user(&self, tenant: &Tenant, email: &str) -> Option<User> {
        self.store
            .find_user_by_email(&tenant.scope(), &Email::parse(email).unwrap())
            .await
            .unwrap()
    }
}

/// `name=value` of the session cookie set by `response`, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("stylecore_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
