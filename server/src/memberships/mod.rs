//! Membership Management Module
//!
//! Grants, role changes, and revocations of site and place memberships,
//! guarded against privilege escalation and audited.

mod error;
pub mod handlers;
mod service;
pub mod types;

use axum::routing::{get, patch};
use axum::Router;

use crate::api::AppState;

pub use error::MembershipError;
pub use service::MembershipService;

/// Site membership routes, nested under `/api/sites`.
pub fn site_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{site_id}/members",
            get(handlers::list_site_members).post(handlers::add_site_member),
        )
        .route(
            "/{site_id}/members/{user_id}",
            patch(handlers::update_site_member).delete(handlers::remove_site_member),
        )
}

/// Place membership routes, nested under `/api/places`.
pub fn place_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{place_id}/members",
            get(handlers::list_place_members).post(handlers::add_place_member),
        )
        .route(
            "/{place_id}/members/{user_id}",
            patch(handlers::update_place_member).delete(handlers::remove_place_member),
        )
}
