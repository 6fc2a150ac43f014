//! Membership HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::error::MembershipError;
use super::types::{AddMemberRequest, UpdateMemberRequest};
use crate::api::AppState;
use crate::permissions::{Actor, PlaceMembership, PlaceRole, SiteMembership, SiteRole};

// ============================================================================
// Site members
// ============================================================================

#[tracing::instrument(skip(state))]
pub async fn list_site_members(
    State(state): State<AppState>,
    actor: Actor,
    Path(site_id): Path<Uuid>,
) -> Result<Json<Vec<SiteMembership>>, MembershipError> {
    let members = state.memberships.list_site_members(&actor, site_id).await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(state))]
pub async fn add_site_member(
    State(state): State<AppState>,
    actor: Actor,
    Path(site_id): Path<Uuid>,
    Json(body): Json<AddMemberRequest<SiteRole>>,
) -> Result<(StatusCode, Json<SiteMembership>), MembershipError> {
    let membership = state
        .memberships
        .add_site_member(&actor, site_id, body.user_id, body.role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[tracing::instrument(skip(state))]
pub async fn update_site_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((site_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRequest<SiteRole>>,
) -> Result<Json<SiteMembership>, MembershipError> {
    let membership = state
        .memberships
        .change_site_member_role(&actor, site_id, user_id, body.role)
        .await?;
    Ok(Json(membership))
}

#[tracing::instrument(skip(state))]
pub async fn remove_site_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((site_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, MembershipError> {
    state
        .memberships
        .remove_site_member(&actor, site_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Place members
// ============================================================================

#[tracing::instrument(skip(state))]
pub async fn list_place_members(
    State(state): State<AppState>,
    actor: Actor,
    Path(place_id): Path<Uuid>,
) -> Result<Json<Vec<PlaceMembership>>, MembershipError> {
    let members = state
        .memberships
        .list_place_members(&actor, place_id)
        .await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(state))]
pub async fn add_place_member(
    State(state): State<AppState>,
    actor: Actor,
    Path(place_id): Path<Uuid>,
    Json(body): Json<AddMemberRequest<PlaceRole>>,
) -> Result<(StatusCode, Json<PlaceMembership>), MembershipError> {
    let membership = state
        .memberships
        .add_place_member(&actor, place_id, body.user_id, body.role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[tracing::instrument(skip(state))]
pub async fn update_place_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((place_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRequest<PlaceRole>>,
) -> Result<Json<PlaceMembership>, MembershipError> {
    let membership = state
        .memberships
        .change_place_member_role(&actor, place_id, user_id, body.role)
        .await?;
    Ok(Json(membership))
}

#[tracing::instrument(skip(state))]
pub async fn remove_place_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((place_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, MembershipError> {
    state
        .memberships
        .remove_place_member(&actor, place_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
