//! Social sign-in: find by provider id, link by email, or create.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use chrono::Utc;

use stylecore_core::{Email, OAuthProvider, UserRole, UserStatus, UserType};
use stylecore_web::db::UserStore;
use stylecore_web::models::NewUser;

use common::{ACME, BELLA, TestApp, body_string, identity, location, session_cookie};

#[tokio::test]
async fn first_login_creates_an_active_verified_user() {
    let app = TestApp::new().await;

    let response = app.google_login(ACME, "ok").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let user = app.user(&app.acme, "nina@example.com").await.unwrap();
    assert_eq!(user.google_id.as_deref(), Some("google-1"));
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.email_verified_at.is_some());
    assert_eq!(user.role, UserRole::Customer);
    assert_eq!(user.user_type, UserType::Client);
    assert_eq!(user.username, "nina");
    assert_eq!(user.name, "Nina Costa");
    assert!(app.mailer.sent().is_empty());

    let cookie = session_cookie(&response).unwrap();
    let dashboard = app.get(ACME, "/dashboard", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
}

#[tokio::test]
async fn repeated_logins_return_the_same_user() {
    let app = TestApp::new().await;

    app.google_login(ACME, "ok").await;
    let first = app.user(&app.acme, "nina@example.com").await.unwrap();

    app.google_login(ACME, "ok").await;
    let again = app
        .store
        .find_user_by_provider(&app.acme.scope(), OAuthProvider::Google, "google-1")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, again.id);
    assert!(!app.store.username_exists("nina1").await.unwrap());
}

#[tokio::test]
async fn matching_email_links_without_replacing_the_avatar() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let existing = app
        .store
        .create_user(
            &app.acme.scope(),
            NewUser {
                tenant_id: None,
                name: "Nina".to_owned(),
                username: "nina_costa".to_owned(),
                email: Email::parse("nina@example.com").unwrap(),
                phone: None,
                role: UserRole::Freelancer,
                user_type: UserType::Professional,
                status: UserStatus::Active,
                email_verified_at: Some(now),
                google_id: None,
                facebook_id: None,
                avatar: Some("https://cdn.example.com/nina.png".to_owned()),
                password_hash: "unused".to_owned(),
            },
        )
        .await
        .unwrap();

    let response = app.google_login(ACME, "ok").await;
    assert_eq!(location(&response), "/dashboard");

    let linked = app.user(&app.acme, "nina@example.com").await.unwrap();
    assert_eq!(linked.id, existing.id);
    assert_eq!(linked.google_id.as_deref(), Some("google-1"));
    assert_eq!(
        linked.avatar.as_deref(),
        Some("https://cdn.example.com/nina.png")
    );
    assert_eq!(linked.role, UserRole::Freelancer);
    assert_eq!(linked.username, "nina_costa");
}

#[tokio::test]
async fn suspended_account_is_refused_and_left_unlinked() {
    let app = TestApp::new().await;
    app.store
        .create_user(
            &app.acme.scope(),
            NewUser {
                tenant_id: None,
                name: "Nina".to_owned(),
                username: "nina_costa".to_owned(),
                email: Email::parse("nina@example.com").unwrap(),
                phone: None,
                role: UserRole::Customer,
                user_type: UserType::Client,
                status: UserStatus::Suspended,
                email_verified_at: None,
                google_id: None,
                facebook_id: None,
                avatar: None,
                password_hash: "unused".to_owned(),
            },
        )
        .await
        .unwrap();

    let response = app.google_login(ACME, "ok").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cookie = session_cookie(&response);
    let login = app.get(ACME, "/login", cookie.as_deref()).await;
    assert!(body_string(login).await.contains("This account has been disabled."));

    let user = app.user(&app.acme, "nina@example.com").await.unwrap();
    assert_eq!(user.status, UserStatus::Suspended);
    assert_eq!(user.google_id, None);
    assert_eq!(user.avatar, None);
    assert!(
        app.store
            .find_user_by_provider(&app.acme.scope(), OAuthProvider::Google, "google-1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn the_same_identity_is_a_separate_user_per_tenant() {
    let app = TestApp::new().await;

    app.google_login(ACME, "ok").await;
    app.google_login(BELLA, "ok").await;

    let in_acme = app.user(&app.acme, "nina@example.com").await.unwrap();
    let in_bella = app.user(&app.bella, "nina@example.com").await.unwrap();
    assert_ne!(in_acme.id, in_bella.id);
    assert_eq!(in_bella.tenant_id, app.bella.id);
    assert_ne!(in_acme.username, in_bella.username);
}

#[tokio::test]
async fn username_collisions_get_a_numeric_suffix() {
    let app = TestApp::new().await;
    app.register(ACME, "nina", "someone@example.com", None)
        .await;

    app.google_login(ACME, "ok").await;

    let user = app.user(&app.acme, "nina@example.com").await.unwrap();
    assert_eq!(user.username, "nina1");
}

#[tokio::test]
async fn profile_without_email_is_refused() {
    let app = TestApp::new().await;
    app.google.set_identity(identity("google-2", None));

    let response = app.google_login(ACME, "ok").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cookie = session_cookie(&response);
    let login = app.get(ACME, "/login", cookie.as_deref()).await;
    assert!(
        body_string(login)
            .await
            .contains("The provider did not share an email address")
    );
    assert!(
        app.store
            .find_user_by_provider(&app.acme.scope(), OAuthProvider::Google, "google-2")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn failed_token_exchange_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.google_login(ACME, "bad").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(app.user(&app.acme, "nina@example.com").await.is_none());
}

#[tokio::test]
async fn state_mismatch_redirects_to_login() {
    let app = TestApp::new().await;

    let start = app.get(ACME, "/auth/google/redirect", None).await;
    let cookie = session_cookie(&start).unwrap();

    let response = app
        .get(
            ACME,
            "/auth/google/callback?code=ok&state=forged",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(app.user(&app.acme, "nina@example.com").await.is_none());
}

#[tokio::test]
async fn redirect_points_at_the_tenant_callback() {
    let app = TestApp::new().await;

    let response = app.get(ACME, "/auth/google/redirect", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let redirect_uri = common::query_param(location(&response), "redirect_uri").unwrap();
    assert_eq!(
        redirect_uri,
        "http://acme-salon.localhost/auth/google/callback"
    );
}

#[tokio::test]
async fn unsupported_or_unconfigured_providers_are_not_found() {
    let app = TestApp::new().await;

    for path in [
        "/auth/twitter/redirect",
        "/auth/twitter/callback",
        "/auth/facebook/redirect",
        "/auth/facebook/callback?code=ok&state=x",
    ] {
        let response = app.get(ACME, path, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}
