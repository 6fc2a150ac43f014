//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{
    http::HeaderValue, middleware::from_fn_with_state, routing::get, Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    admin, auth,
    audit::AuditSink,
    config::Config,
    memberships::{self, MembershipService},
    permissions::{
        MembershipGuard, MembershipStore, PermissionResolver, RoleHierarchy, SiteStore, UserStore,
    },
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Global role lookups
    pub users: Arc<dyn UserStore>,
    /// Tenant management
    pub sites: Arc<dyn SiteStore>,
    /// Audit log
    pub audit: Arc<dyn AuditSink>,
    /// Read/act permission checks
    pub resolver: Arc<PermissionResolver>,
    /// Guarded membership operations
    pub memberships: Arc<MembershipService>,
}

impl AppState {
    /// Wire the permission system over a single store backend.
    #[must_use]
    pub fn new<S>(config: Config, store: Arc<S>) -> Self
    where
        S: UserStore + MembershipStore + SiteStore + AuditSink + 'static,
    {
        let resolver = Arc::new(PermissionResolver::new(
            store.clone(),
            Arc::new(RoleHierarchy::new()),
        ));
        let guard = Arc::new(MembershipGuard::new(resolver.clone()));
        let memberships = Arc::new(MembershipService::new(
            store.clone(),
            store.clone(),
            resolver.clone(),
            guard,
            store.clone(),
        ));

        Self {
            config: Arc::new(config),
            users: store.clone(),
            sites: store.clone(),
            audit: store,
            resolver,
            memberships,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .nest("/api/sites", memberships::site_router())
        .nest("/api/places", memberships::place_router())
        .nest("/api/admin", admin::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(protected_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match &config.cors_allowed_origins {
        Some(origins) => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                }),
        ),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
