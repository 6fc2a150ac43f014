//! Membership endpoint errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::permissions::{AuthzError, DenyReason};

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Membership already exists")]
    Conflict,

    /// The reason is logged and audited, never sent to the client.
    #[error("Access denied")]
    Forbidden(DenyReason),

    #[error("Database error")]
    Database(#[source] sqlx::Error),
}

impl From<AuthzError> for MembershipError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(entity) => Self::NotFound(entity),
            AuthzError::Conflict => Self::Conflict,
            AuthzError::PermissionDenied { reason } => Self::Forbidden(reason),
            AuthzError::Database(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for MembershipError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Conflict => (StatusCode::CONFLICT, "conflict"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Database(err) => {
                tracing::error!(%err, "Membership endpoint database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}
