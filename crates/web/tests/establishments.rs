//! Establishment endpoints and their owner/staff policy.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{ACME, BELLA, TestApp, body_string};

struct Salon {
    app: TestApp,
    owner: String,
    customer: String,
    customer_id: i32,
    establishment_id: i64,
}

async fn salon() -> Salon {
    let app = TestApp::with_verification(false).await;
    let (_, owner) = app
        .register(ACME, "owner", "owner@example.com", Some("establishment"))
        .await;
    let (_, customer) = app.register(ACME, "carla", "carla@example.com", None).await;
    let owner = owner.unwrap();
    let customer = customer.unwrap();
    let customer_id = app.user(&app.acme, "carla@example.com").await.unwrap().id;

    let created = app
        .post_json(
            ACME,
            "/establishments",
            &json!({ "name": "  Downtown  ", "description": "Cuts and color" }),
            Some(&owner),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body_string(created).await).unwrap();
    assert_eq!(body["name"], "Downtown");
    assert_eq!(body["tenant_id"], "acme-salon");

    Salon {
        establishment_id: body["id"].as_i64().unwrap(),
        customer_id: customer_id.as_i32(),
        app,
        owner,
        customer,
    }
}

#[tokio::test]
async fn only_owners_create_establishments() {
    let Salon { app, customer, .. } = salon().await;

    let response = app
        .post_json(ACME, "/establishments", &json!({ "name": "Mine" }), Some(&customer))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let Salon {
        app,
        establishment_id,
        ..
    } = salon().await;

    let create = app
        .post_json(ACME, "/establishments", &json!({ "name": "X" }), None)
        .await;
    assert_eq!(create.status(), StatusCode::UNAUTHORIZED);

    let show = app
        .get(ACME, &format!("/establishments/{establishment_id}"), None)
        .await;
    assert_eq!(show.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let Salon { app, owner, .. } = salon().await;

    let response = app
        .post_json(ACME, "/establishments", &json!({ "name": "   " }), Some(&owner))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn staff_can_view_once_added() {
    let Salon {
        app,
        owner,
        customer,
        customer_id,
        establishment_id,
    } = salon().await;
    let path = format!("/establishments/{establishment_id}");

    let before = app.get(ACME, &path, Some(&customer)).await;
    assert_eq!(before.status(), StatusCode::FORBIDDEN);

    let added = app
        .post_json(
            ACME,
            &format!("{path}/staff"),
            &json!({ "user_id": customer_id }),
            Some(&owner),
        )
        .await;
    assert_eq!(added.status(), StatusCode::NO_CONTENT);

    let after = app.get(ACME, &path, Some(&customer)).await;
    assert_eq!(after.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(after).await).unwrap();
    assert_eq!(body["staff"], json!([customer_id]));
}

#[tokio::test]
async fn staff_cannot_add_staff() {
    let Salon {
        app,
        owner,
        customer,
        customer_id,
        establishment_id,
    } = salon().await;
    let path = format!("/establishments/{establishment_id}/staff");

    app.post_json(ACME, &path, &json!({ "user_id": customer_id }), Some(&owner))
        .await;

    let response = app
        .post_json(ACME, &path, &json!({ "user_id": customer_id }), Some(&customer))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn establishments_are_invisible_to_other_tenants() {
    let Salon {
        app,
        establishment_id,
        ..
    } = salon().await;
    let (_, rival) = app
        .register(BELLA, "rival", "rival@example.com", Some("establishment"))
        .await;

    let response = app
        .get(
            BELLA,
            &format!("/establishments/{establishment_id}"),
            rival.as_deref(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_of_other_tenants_cannot_become_staff() {
    let Salon {
        app,
        owner,
        establishment_id,
        ..
    } = salon().await;
    app.register(BELLA, "outsider", "outsider@example.com", None)
        .await;
    let outsider = app
        .user(&app.bella, "outsider@example.com")
        .await
        .unwrap();

    let response = app
        .post_json(
            ACME,
            &format!("/establishments/{establishment_id}/staff"),
            &json!({ "user_id": outsider.id }),
            Some(&owner),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
