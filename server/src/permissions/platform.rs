//! Platform-scope operations and their allow-lists.
//!
//! These operations are not tied to a site or place (managing tenants,
//! changing global roles). Superadmins are always allowed; every other global
//! role must appear in the operation's allow-list.

use super::error::{AuthzError, DenyReason};
use super::models::Actor;
use super::roles::GlobalRole;

/// Operation on the platform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformOperation {
    /// List every site on the platform
    ListSites,
    /// Create a new site (tenant)
    CreateSite,
    /// Rename an existing site
    RenameSite,
    /// Delete a site together with its places and memberships
    DeleteSite,
    /// Change a user's platform-wide role
    SetGlobalRole,
    /// Read the membership audit log
    ViewAuditLog,
}

impl PlatformOperation {
    /// Returns the action name for audit logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirhub_server::permissions::PlatformOperation;
    ///
    /// assert_eq!(PlatformOperation::DeleteSite.action_name(), "delete_site");
    /// ```
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::ListSites => "list_sites",
            Self::CreateSite => "create_site",
            Self::RenameSite => "rename_site",
            Self::DeleteSite => "delete_site",
            Self::SetGlobalRole => "set_global_role",
            Self::ViewAuditLog => "view_audit_log",
        }
    }

    /// Returns all platform operations.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ListSites,
            Self::CreateSite,
            Self::RenameSite,
            Self::DeleteSite,
            Self::SetGlobalRole,
            Self::ViewAuditLog,
        ]
    }

    /// Global roles allowed to perform this operation, superadmin aside.
    ///
    /// An empty list means superadmin only.
    #[must_use]
    pub const fn allowed_roles(&self) -> &'static [GlobalRole] {
        match self {
            Self::ListSites => &[GlobalRole::Viewer, GlobalRole::Editor, GlobalRole::Admin],
            Self::CreateSite | Self::RenameSite | Self::ViewAuditLog => &[GlobalRole::Admin],
            Self::DeleteSite | Self::SetGlobalRole => &[],
        }
    }
}

/// Platform-scope gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformGate;

impl PlatformGate {
    /// Whether `actor` may perform `operation`.
    #[must_use]
    pub fn permits(actor: &Actor, operation: PlatformOperation) -> bool {
        if actor.global_role.is_superadmin() {
            return true;
        }
        operation.allowed_roles().contains(&actor.global_role)
    }

    /// Like [`Self::permits`], as a `Result`.
    pub fn require(actor: &Actor, operation: PlatformOperation) -> Result<(), AuthzError> {
        if Self::permits(actor, operation) {
            Ok(())
        } else {
            tracing::warn!(
                actor_id = %actor.id,
                global_role = %actor.global_role,
                operation = operation.action_name(),
                "Platform operation denied"
            );
            Err(AuthzError::denied(DenyReason::InsufficientAuthority))
        }
    }
}
