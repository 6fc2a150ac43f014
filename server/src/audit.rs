//! Audit trail for guarded mutations.
//!
//! The permission core only returns results. Callers record one
//! [`AuditEvent`] per guarded mutation, whatever its outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::permissions::{AuthzError, DenyReason, Scope, StoreError};

/// What was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    CreateMembership,
    UpdateMembershipRole,
    DeleteMembership,
    SetGlobalRole,
    CreateSite,
    RenameSite,
    DeleteSite,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateMembership => "membership.create",
            Self::UpdateMembershipRole => "membership.update_role",
            Self::DeleteMembership => "membership.delete",
            Self::SetGlobalRole => "user.set_global_role",
            Self::CreateSite => "site.create",
            Self::RenameSite => "site.rename",
            Self::DeleteSite => "site.delete",
        }
    }
}

/// How it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditOutcome {
    Success,
    Denied(DenyReason),
    Conflict,
    NotFound,
    /// Request rejected by input validation after passing the gate.
    Invalid,
    Error,
}

impl AuditOutcome {
    /// Classify a guarded operation's result.
    #[must_use]
    pub const fn of<T>(result: &Result<T, AuthzError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(AuthzError::PermissionDenied { reason }) => Self::Denied(*reason),
            Err(AuthzError::Conflict) => Self::Conflict,
            Err(AuthzError::NotFound(_)) => Self::NotFound,
            Err(AuthzError::Database(_)) => Self::Error,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Denied(_) => "denied",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn reason(self) -> Option<DenyReason> {
        match self {
            Self::Denied(reason) => Some(reason),
            _ => None,
        }
    }
}

/// One guarded mutation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub actor_id: Uuid,
    pub action: AuditAction,
    /// `None` for platform-scope actions.
    pub scope: Option<Scope>,
    pub target_user_id: Option<Uuid>,
    /// Role requested, or the role removed for deletes.
    pub role: Option<&'static str>,
    pub outcome: AuditOutcome,
}

/// Persisted audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub scope_kind: Option<String>,
    pub scope_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub role: Option<String>,
    pub outcome: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Build the row an event is stored as.
    #[must_use]
    pub fn from_event(event: &AuditEvent) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id: event.actor_id,
            action: event.action.as_str().to_string(),
            scope_kind: event.scope.map(|s| s.kind().to_string()),
            scope_id: event.scope.map(|s| s.id()),
            target_user_id: event.target_user_id,
            role: event.role.map(str::to_string),
            outcome: event.outcome.as_str().to_string(),
            reason: event.outcome.reason().map(|r| r.code().to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Audit log collaborator.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError>;

    /// Most recent entries first.
    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, StoreError>;
}

/// Record an event, logging instead of failing if the sink is unavailable.
///
/// The caller's own result always wins over an audit write failure.
pub async fn record_quietly(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.record(&event).await {
        tracing::error!(
            error = %e,
            action = event.action.as_str(),
            actor_id = %event.actor_id,
            "Failed to write audit log entry"
        );
    }
}
