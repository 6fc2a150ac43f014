//! Admin types: errors, requests, responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::audit::{AuditEntry, AuditOutcome};
use crate::permissions::{AuthzError, DenyReason, GlobalRole};

/// Admin API error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Actor's global role does not allow the operation.
    #[error("Insufficient platform privileges")]
    Forbidden,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[source] sqlx::Error),
}

impl From<AuthzError> for AdminError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(entity) => Self::NotFound(entity),
            // Sites have no unique keys; a conflict here is a store bug
            AuthzError::Conflict => Self::Validation("Conflicting change".to_string()),
            AuthzError::PermissionDenied { .. } => Self::Forbidden,
            AuthzError::Database(e) => Self::Database(e),
        }
    }
}

impl AdminError {
    /// How a failed attempt is classified in the audit log.
    #[must_use]
    pub const fn audit_outcome(&self) -> AuditOutcome {
        match self {
            Self::Forbidden => AuditOutcome::Denied(DenyReason::InsufficientAuthority),
            Self::NotFound(_) => AuditOutcome::NotFound,
            Self::Validation(_) => AuditOutcome::Invalid,
            Self::Database(_) => AuditOutcome::Error,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Forbidden => (StatusCode::FORBIDDEN, serde_json::json!({"error": "forbidden", "message": "Insufficient platform privileges"})),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, serde_json::json!({"error": "not_found", "message": format!("{what} not found")})),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, serde_json::json!({"error": "validation", "message": msg})),
            Self::Database(err) => {
                tracing::error!(%err, "Admin endpoint database error");
                (StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({"error": "database", "message": "Database error"}))
            }
        };
        (status, Json(body)).into_response()
    }
}

// Request types
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    #[validate(length(min = 2, max = 200, message = "Name must be 2-200 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameSiteRequest {
    #[validate(length(min = 2, max = 200, message = "Name must be 2-200 characters"))]
    pub name: String,
}

impl CreateSiteRequest {
    /// The trimmed name, once it passes the length rules.
    pub fn into_name(self) -> Result<String, AdminError> {
        let request = Self {
            name: self.name.trim().to_owned(),
        };
        check(&request)?;
        Ok(request.name)
    }
}

impl RenameSiteRequest {
    /// The trimmed name, once it passes the length rules.
    pub fn into_name(self) -> Result<String, AdminError> {
        let request = Self {
            name: self.name.trim().to_owned(),
        };
        check(&request)?;
        Ok(request.name)
    }
}

fn check(request: &impl Validate) -> Result<(), AdminError> {
    request
        .validate()
        .map_err(|e| AdminError::Validation(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct SetGlobalRoleRequest {
    pub role: GlobalRole,
}

/// Query parameters for paginated lists.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: i64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_limit() -> i64 {
    50
}

// Response types
#[derive(Debug, Serialize)]
pub struct GlobalRoleResponse {
    pub user_id: uuid::Uuid,
    pub global_role: GlobalRole,
}

#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditEntry>,
    pub limit: i64,
    pub offset: i64,
}
