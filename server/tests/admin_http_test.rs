//! HTTP integration tests for platform administration endpoints.
//!
//! Run with: `cargo test --test admin_http_test`

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::{body_to_json, TestApp};
use serde_json::json;
use uuid::Uuid;

use dirhub_server::audit::AuditSink;
use dirhub_server::permissions::{GlobalRole, MembershipStore, PlaceRole, SiteStore, UserStore};

#[tokio::test]
async fn test_admin_creates_and_renames_site() {
    let app = TestApp::new();
    let admin = app.user(GlobalRole::Admin).await;

    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            admin,
            Some(json!({ "name": "Old Town" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let site = body_to_json(response).await;
    let site_id = site["id"].as_str().unwrap().to_string();

    let response = app
        .send(
            Method::PATCH,
            &format!("/api/admin/sites/{site_id}"),
            admin,
            Some(json!({ "name": "New Town" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["name"], "New Town");
}

#[tokio::test]
async fn test_viewer_lists_but_cannot_create_sites() {
    let app = TestApp::new();
    app.site("Harbor District").await;
    let viewer = app.user(GlobalRole::Viewer).await;

    let response = app.send(Method::GET, "/api/admin/sites", viewer, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            viewer,
            Some(json!({ "name": "Old Town" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_site_name_is_validated() {
    let app = TestApp::new();
    let admin = app.user(GlobalRole::Admin).await;

    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            admin,
            Some(json!({ "name": "x" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["error"], "validation");
}

#[tokio::test]
async fn test_whitespace_only_site_name_is_rejected() {
    let app = TestApp::new();
    let superadmin = app.user(GlobalRole::Superadmin).await;

    for name in ["     ", " x "] {
        let response = app
            .send(
                Method::POST,
                "/api/admin/sites",
                superadmin,
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name:?}");
    }
    assert!(app.store.list_sites().await.unwrap().is_empty());

    let site_id = app.site("Harbor District").await;
    let response = app
        .send(
            Method::PATCH,
            &format!("/api/admin/sites/{site_id}"),
            superadmin,
            Some(json!({ "name": "   " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            superadmin,
            Some(json!({ "name": "  Old Town  " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_to_json(response).await["name"], "Old Town");
}

#[tokio::test]
async fn test_gate_runs_before_site_name_validation() {
    let app = TestApp::new();
    let viewer = app.user(GlobalRole::Viewer).await;
    let admin = app.user(GlobalRole::Admin).await;

    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            viewer,
            Some(json!({ "name": "x" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let entry = app.store.recent(1, 0).await.unwrap().remove(0);
    assert_eq!(entry.actor_id, viewer);
    assert_eq!(entry.action, "site.create");
    assert_eq!(entry.outcome, "denied");
    assert_eq!(entry.reason.as_deref(), Some("insufficient-authority"));

    // Invalid input from a permitted actor is audited too
    let response = app
        .send(
            Method::POST,
            "/api/admin/sites",
            admin,
            Some(json!({ "name": "x" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let entry = app.store.recent(1, 0).await.unwrap().remove(0);
    assert_eq!(entry.actor_id, admin);
    assert_eq!(entry.outcome, "invalid");
    assert!(entry.reason.is_none());
}

#[tokio::test]
async fn test_only_superadmin_deletes_sites() {
    let app = TestApp::new();
    let site_id = app.site("Harbor District").await;
    let place_id = app.place(site_id).await;
    let editor = app.place_member(place_id, PlaceRole::Editor).await;
    let admin = app.user(GlobalRole::Admin).await;
    let superadmin = app.user(GlobalRole::Superadmin).await;
    let uri = format!("/api/admin/sites/{site_id}");

    let response = app.send(Method::DELETE, &uri, admin, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(Method::DELETE, &uri, superadmin, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.store.find_place(place_id).await.unwrap().is_none());
    assert!(app
        .store
        .find_place_membership(place_id, editor)
        .await
        .unwrap()
        .is_none());

    let response = app.send(Method::DELETE, &uri, superadmin, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_role_changes_are_superadmin_only() {
    let app = TestApp::new();
    let admin = app.user(GlobalRole::Admin).await;
    let superadmin = app.user(GlobalRole::Superadmin).await;
    let target = app.user(GlobalRole::Viewer).await;
    let uri = format!("/api/admin/users/{target}/global-role");

    let response = app
        .send(Method::PUT, &uri, admin, Some(json!({ "role": "superadmin" })))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.store.find_global_role(target).await.unwrap(),
        Some(GlobalRole::Viewer)
    );

    let response = app
        .send(Method::PUT, &uri, superadmin, Some(json!({ "role": "editor" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["global_role"], "editor");
    assert_eq!(
        app.store.find_global_role(target).await.unwrap(),
        Some(GlobalRole::Editor)
    );

    let response = app
        .send(
            Method::PUT,
            &format!("/api/admin/users/{}/global-role", Uuid::new_v4()),
            superadmin,
            Some(json!({ "role": "editor" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promotion_applies_on_next_request() {
    let app = TestApp::new();
    let site_id = app.site("Harbor District").await;
    let place_id = app.place(site_id).await;
    let superadmin = app.user(GlobalRole::Superadmin).await;
    let user = app.user(GlobalRole::Viewer).await;
    let members = format!("/api/places/{place_id}/members");

    let response = app.send(Method::GET, &members, user, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(
            Method::PUT,
            &format!("/api/admin/users/{user}/global-role"),
            superadmin,
            Some(json!({ "role": "superadmin" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same token, role re-read from the store
    let response = app.send(Method::GET, &members, user, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_audit_log_records_denials() {
    let app = TestApp::new();
    let site_id = app.site("Harbor District").await;
    let place_id = app.place(site_id).await;
    let manager = app.place_member(place_id, PlaceRole::Manager).await;
    let target = app.user(GlobalRole::Viewer).await;
    let admin = app.user(GlobalRole::Admin).await;

    app.send(
        Method::POST,
        &format!("/api/places/{place_id}/members"),
        manager,
        Some(json!({ "user_id": target, "role": "owner" })),
    )
    .await;

    let response = app
        .send(Method::GET, "/api/admin/audit-log?limit=10", admin, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response).await;
    assert_eq!(body["limit"], 10);
    let entry = &body["items"][0];
    assert_eq!(entry["action"], "membership.create");
    assert_eq!(entry["outcome"], "denied");
    assert_eq!(entry["reason"], "cannot-assign-owner");
    assert_eq!(entry["scope_kind"], "place");
    assert_eq!(entry["actor_id"], manager.to_string());
}

#[tokio::test]
async fn test_audit_log_requires_admin() {
    let app = TestApp::new();
    let editor = app.user(GlobalRole::Editor).await;

    let response = app
        .send(Method::GET, "/api/admin/audit-log", editor, None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
