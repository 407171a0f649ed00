//! Host-based tenant resolution and session isolation.

#![allow(clippy::unwrap_used)]

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

use common::{ACME, BELLA, TestApp, body_string, location};

#[tokio::test]
async fn unknown_host_is_not_found() {
    let app = TestApp::new().await;

    for path in ["/login", "/register", "/dashboard", "/auth/google/redirect"] {
        let response = app.get("nobody.localhost", path, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn missing_host_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .send(Request::get("/login").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_checks_ignore_the_host() {
    let app = TestApp::new().await;

    let live = app.get("nobody.localhost", "/health", None).await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(body_string(live).await, "ok");

    let ready = app.get("nobody.localhost", "/health/ready", None).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn host_port_and_case_are_ignored() {
    let app = TestApp::new().await;

    let response = app.get("Acme-Salon.LOCALHOST:8000", "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Acme Salon"));
}

#[tokio::test]
async fn additional_domains_route_to_their_tenant() {
    use stylecore_web::db::TenantStore;

    let app = TestApp::new().await;
    app.store
        .add_domain(&app.bella.id, "bella-salon.example.com")
        .await
        .unwrap();

    let response = app.get("bella-salon.example.com", "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Bella"));
}

#[tokio::test]
async fn each_tenant_renders_its_own_pages() {
    let app = TestApp::new().await;

    let acme = body_string(app.get(ACME, "/login", None).await).await;
    let bella = body_string(app.get(BELLA, "/login", None).await).await;
    assert!(acme.contains("Acme Salon"));
    assert!(!bella.contains("Acme Salon"));
}

#[tokio::test]
async fn a_session_does_not_carry_over_to_another_tenant() {
    let app = TestApp::with_verification(false).await;
    let (_, cookie) = app.register(ACME, "ana", "ana@example.com", None).await;
    let cookie = cookie.unwrap();

    let home = app.get(ACME, "/dashboard", Some(&cookie)).await;
    assert_eq!(home.status(), StatusCode::OK);

    let away = app.get(BELLA, "/dashboard", Some(&cookie)).await;
    assert_eq!(away.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&away), "/login");
}

#[tokio::test]
async fn dashboard_requires_login() {
    let app = TestApp::new().await;

    let response = app.get(ACME, "/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let root = app.get(ACME, "/", None).await;
    assert_eq!(location(&root), "/dashboard");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::get("/login")
                .header(header::HOST, ACME)
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let headers = response.headers();
    assert_eq!(headers.get("x-request-id").unwrap(), "req-123");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::with_verification(false).await;
    let (_, cookie) = app.register(ACME, "ana", "ana@example.com", None).await;
    let cookie = cookie.unwrap();

    let response = app.post_form(ACME, "/logout", &[], Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let dashboard = app.get(ACME, "/dashboard", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
}
