//! Platform Admin Module
//!
//! Platform-scope endpoints, each gated by the caller's global role:
//! - Sites: list, create, rename, delete
//! - Users: change global role (superadmin only)
//! - Audit log

pub mod handlers;
pub mod types;

use axum::{
    routing::{get, patch, put},
    Router,
};

use crate::api::AppState;

pub use types::AdminError;

/// Create the admin router, nested under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sites",
            get(handlers::list_sites).post(handlers::create_site),
        )
        .route(
            "/sites/{site_id}",
            patch(handlers::rename_site).delete(handlers::delete_site),
        )
        .route("/users/{user_id}/global-role", put(handlers::set_global_role))
        .route("/audit-log", get(handlers::get_audit_log))
}
