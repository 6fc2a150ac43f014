//! Authorization error types.

use serde::Serialize;
use thiserror::Error;

/// Why a permission check or membership mutation was refused.
///
/// These codes are for decisioning, audit, and tests. They are not echoed to
/// end users, who only see a generic authorization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    /// No authority at the scope, or not enough of it.
    InsufficientAuthority,
    /// Attempted to grant the top role of the scope (`owner` / `siteadmin`).
    CannotAssignOwner,
    /// Attempted to change or remove a membership holding the top role.
    CannotModifyOwner,
}

impl DenyReason {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InsufficientAuthority => "insufficient-authority",
            Self::CannotAssignOwner => "cannot-assign-owner",
            Self::CannotModifyOwner => "cannot-modify-owner",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors reported by store collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row already exists for the unique key.
    #[error("Row already exists")]
    Conflict,

    /// The referenced row does not exist.
    #[error("Row not found")]
    NotFound,

    /// Underlying I/O failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Terminal outcome of an authorization decision or guarded mutation.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Referenced actor, scope, or membership does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A membership already exists for the target `(scope, user)` pair.
    #[error("Membership already exists")]
    Conflict,

    /// Actor lacks the authority for this operation.
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: DenyReason },

    /// Store I/O failure, propagated unchanged.
    #[error("Database error")]
    Database(#[source] sqlx::Error),
}

impl AuthzError {
    #[must_use]
    pub const fn denied(reason: DenyReason) -> Self {
        Self::PermissionDenied { reason }
    }

    /// The deny reason, if this is a permission failure.
    #[must_use]
    pub const fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::PermissionDenied { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Map a store `NotFound` onto the entity the caller was looking for.
    #[must_use]
    pub fn from_store(err: StoreError, entity: &'static str) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotFound => Self::NotFound(entity),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl From<StoreError> for AuthzError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, "Resource")
    }
}

impl From<sqlx::Error> for AuthzError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}
