//! Platform administration handlers.
//!
//! Every handler is gated by [`PlatformGate`] before its input is checked;
//! mutations are audited whatever the outcome.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::types::{
    AdminError, AuditLogPage, CreateSiteRequest, GlobalRoleResponse, PaginationParams,
    RenameSiteRequest, SetGlobalRoleRequest,
};
use crate::api::AppState;
use crate::audit::{record_quietly, AuditAction, AuditEvent, AuditOutcome};
use crate::permissions::{Actor, AuthzError, PlatformGate, PlatformOperation, Scope, Site};

/// Record the outcome of a platform mutation.
async fn audit<T>(
    state: &AppState,
    actor: &Actor,
    action: AuditAction,
    scope: Option<Scope>,
    target_user_id: Option<Uuid>,
    role: Option<&'static str>,
    result: &Result<T, AdminError>,
) {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(e) => e.audit_outcome(),
    };
    record_quietly(
        state.audit.as_ref(),
        AuditEvent {
            actor_id: actor.id,
            action,
            scope,
            target_user_id,
            role,
            outcome,
        },
    )
    .await;
}

/// List all sites.
///
/// `GET /api/admin/sites`
#[tracing::instrument(skip(state))]
pub async fn list_sites(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Site>>, AdminError> {
    PlatformGate::require(&actor, PlatformOperation::ListSites)?;
    let sites = state
        .sites
        .list_sites()
        .await
        .map_err(|e| AuthzError::from_store(e, "Site"))?;
    Ok(Json(sites))
}

/// Create a site.
///
/// `POST /api/admin/sites`
#[tracing::instrument(skip(state))]
pub async fn create_site(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<Site>), AdminError> {
    let result: Result<Site, AdminError> = async {
        PlatformGate::require(&actor, PlatformOperation::CreateSite)?;
        let name = body.into_name()?;
        state
            .sites
            .create_site(&name)
            .await
            .map_err(|e| AdminError::from(AuthzError::from_store(e, "Site")))
    }
    .await;

    let scope = result.as_ref().ok().map(|site| Scope::Site(site.id));
    audit(&state, &actor, AuditAction::CreateSite, scope, None, None, &result).await;

    Ok((StatusCode::CREATED, Json(result?)))
}

/// Rename a site.
///
/// `PATCH /api/admin/sites/{site_id}`
#[tracing::instrument(skip(state))]
pub async fn rename_site(
    State(state): State<AppState>,
    actor: Actor,
    Path(site_id): Path<Uuid>,
    Json(body): Json<RenameSiteRequest>,
) -> Result<Json<Site>, AdminError> {
    let result: Result<Site, AdminError> = async {
        PlatformGate::require(&actor, PlatformOperation::RenameSite)?;
        let name = body.into_name()?;
        state
            .sites
            .rename_site(site_id, &name)
            .await
            .map_err(|e| AdminError::from(AuthzError::from_store(e, "Site")))
    }
    .await;

    audit(
        &state,
        &actor,
        AuditAction::RenameSite,
        Some(Scope::Site(site_id)),
        None,
        None,
        &result,
    )
    .await;

    Ok(Json(result?))
}

/// Delete a site with its places and memberships.
///
/// `DELETE /api/admin/sites/{site_id}`
#[tracing::instrument(skip(state))]
pub async fn delete_site(
    State(state): State<AppState>,
    actor: Actor,
    Path(site_id): Path<Uuid>,
) -> Result<StatusCode, AdminError> {
    let result: Result<(), AdminError> = async {
        PlatformGate::require(&actor, PlatformOperation::DeleteSite)?;
        state
            .sites
            .delete_site(site_id)
            .await
            .map_err(|e| AdminError::from(AuthzError::from_store(e, "Site")))
    }
    .await;

    audit(
        &state,
        &actor,
        AuditAction::DeleteSite,
        Some(Scope::Site(site_id)),
        None,
        None,
        &result,
    )
    .await;

    result?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change a user's platform-wide role. Superadmin only.
///
/// `PUT /api/admin/users/{user_id}/global-role`
#[tracing::instrument(skip(state))]
pub async fn set_global_role(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetGlobalRoleRequest>,
) -> Result<Json<GlobalRoleResponse>, AdminError> {
    let result: Result<(), AdminError> = async {
        PlatformGate::require(&actor, PlatformOperation::SetGlobalRole)?;
        state
            .users
            .set_global_role(user_id, body.role)
            .await
            .map_err(|e| AdminError::from(AuthzError::from_store(e, "User")))
    }
    .await;

    audit(
        &state,
        &actor,
        AuditAction::SetGlobalRole,
        None,
        Some(user_id),
        Some(body.role.as_str()),
        &result,
    )
    .await;

    result?;
    Ok(Json(GlobalRoleResponse {
        user_id,
        global_role: body.role,
    }))
}

/// Get the audit log, newest first.
///
/// `GET /api/admin/audit-log`
#[tracing::instrument(skip(state))]
pub async fn get_audit_log(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<PaginationParams>,
) -> Result<Json<AuditLogPage>, AdminError> {
    PlatformGate::require(&actor, PlatformOperation::ViewAuditLog)?;

    // Clamp limit to reasonable bounds
    let limit = params.limit.clamp(1, 100);
    let offset = params.offset.max(0);

    let items = state
        .audit
        .recent(limit, offset)
        .await
        .map_err(AuthzError::from)?;

    Ok(Json(AuditLogPage {
        items,
        limit,
        offset,
    }))
}
