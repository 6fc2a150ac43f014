//! Database models and scope types for the permission system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::roles::{GlobalRole, PlaceRole, SiteRole};

/// The authenticated user a decision is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub global_role: GlobalRole,
}

impl Actor {
    #[must_use]
    pub const fn new(id: Uuid, global_role: GlobalRole) -> Self {
        Self { id, global_role }
    }
}

/// Tenant boundary.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a place the permission system needs.
#[derive(Debug, Clone, Copy, FromRow, Serialize, PartialEq, Eq)]
pub struct Place {
    pub id: Uuid,
    pub site_id: Uuid,
    /// Denormalized owner; grants the same authority as an `owner` membership.
    pub owner_id: Option<Uuid>,
}

/// Site membership row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteMembership {
    pub id: Uuid,
    pub site_id: Uuid,
    pub user_id: Uuid,
    pub role: SiteRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Place membership row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceMembership {
    pub id: Uuid,
    pub place_id: Uuid,
    pub user_id: Uuid,
    pub role: PlaceRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tenancy level a decision is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Scope {
    Site(Uuid),
    Place(Uuid),
}

impl Scope {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Site(_) => "site",
            Self::Place(_) => "place",
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Site(id) | Self::Place(id) => *id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A role at a specific scope.
///
/// Used both as a requirement ("at least this role here") and to name an
/// existing membership's role when revoking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopedRole {
    Site { site_id: Uuid, role: SiteRole },
    Place { place_id: Uuid, role: PlaceRole },
}

/// Minimum role an actor needs at a scope.
pub type Requirement = ScopedRole;

impl ScopedRole {
    #[must_use]
    pub const fn site(site_id: Uuid, role: SiteRole) -> Self {
        Self::Site { site_id, role }
    }

    #[must_use]
    pub const fn place(place_id: Uuid, role: PlaceRole) -> Self {
        Self::Place { place_id, role }
    }

    #[must_use]
    pub const fn scope(&self) -> Scope {
        match self {
            Self::Site { site_id, .. } => Scope::Site(*site_id),
            Self::Place { place_id, .. } => Scope::Place(*place_id),
        }
    }

    #[must_use]
    pub const fn role_name(&self) -> &'static str {
        match self {
            Self::Site { role, .. } => role.as_str(),
            Self::Place { role, .. } => role.as_str(),
        }
    }
}

/// A requested grant or role update, with the role the target currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Site {
        site_id: Uuid,
        target: SiteRole,
        current: Option<SiteRole>,
    },
    Place {
        place_id: Uuid,
        target: PlaceRole,
        current: Option<PlaceRole>,
    },
}

impl RoleChange {
    #[must_use]
    pub const fn scope(&self) -> Scope {
        match self {
            Self::Site { site_id, .. } => Scope::Site(*site_id),
            Self::Place { place_id, .. } => Scope::Place(*place_id),
        }
    }
}
