//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router backed by an [`InMemoryStore`], plus utilities for seeding users,
//! sites, places, and memberships, and for minting access tokens.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use dirhub_server::api::{create_router, AppState};
use dirhub_server::auth::jwt;
use dirhub_server::config::Config;
use dirhub_server::db::InMemoryStore;
use dirhub_server::permissions::{GlobalRole, MembershipStore, PlaceRole, SiteRole};

/// Full application over an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub config: Arc<Config>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::default_for_test();
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(config.clone(), store.clone());

        Self {
            router: create_router(state),
            store,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send an authenticated request with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Uuid,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let token = self.token(user_id);
        let builder = Self::request(method, uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.oneshot(request).await
    }

    /// Mint an access token for `user_id`.
    pub fn token(&self, user_id: Uuid) -> String {
        jwt::generate_access_token(user_id, &self.config.jwt_secret, self.config.jwt_access_expiry)
            .expect("Failed to generate access token")
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    pub async fn user(&self, role: GlobalRole) -> Uuid {
        self.store.add_user(role).await
    }

    pub async fn site(&self, name: &str) -> Uuid {
        self.store.add_site(name).await
    }

    pub async fn place(&self, site_id: Uuid) -> Uuid {
        self.store.add_place(site_id, None).await
    }

    /// New viewer holding `role` at the place.
    pub async fn place_member(&self, place_id: Uuid, role: PlaceRole) -> Uuid {
        let user_id = self.user(GlobalRole::Viewer).await;
        self.store
            .create_place_membership(place_id, user_id, role)
            .await
            .expect("Failed to seed place membership");
        user_id
    }

    /// New viewer holding `role` at the site.
    pub async fn site_member(&self, site_id: Uuid, role: SiteRole) -> Uuid {
        let user_id = self.user(GlobalRole::Viewer).await;
        self.store
            .create_site_membership(site_id, user_id, role)
            .await
            .expect("Failed to seed site membership");
        user_id
    }
}

/// Read a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
