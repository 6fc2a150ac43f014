//! Closed role enumerations for each scope kind.
//!
//! Each enum maps onto a Postgres enum type of the same name, so no role
//! outside these sets can be persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform-wide role carried by every user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "global_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    #[default]
    Viewer,
    Editor,
    Admin,
    Superadmin,
}

/// Role held through a site membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "site_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SiteRole {
    Editor,
    Siteadmin,
}

/// Role held through a place membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "place_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlaceRole {
    Editor,
    Manager,
    Owner,
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} role: {value}")]
pub struct UnknownRole {
    pub kind: &'static str,
    pub value: String,
}

impl GlobalRole {
    pub const ALL: [Self; 4] = [Self::Viewer, Self::Editor, Self::Admin, Self::Superadmin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    /// Superadmins bypass every scoped check.
    #[must_use]
    pub const fn is_superadmin(self) -> bool {
        matches!(self, Self::Superadmin)
    }
}

impl SiteRole {
    pub const ALL: [Self; 2] = [Self::Editor, Self::Siteadmin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Siteadmin => "siteadmin",
        }
    }

    /// Position of this role in per-role lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Editor => 0,
            Self::Siteadmin => 1,
        }
    }
}

impl PlaceRole {
    pub const ALL: [Self; 3] = [Self::Editor, Self::Manager, Self::Owner];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Manager => "manager",
            Self::Owner => "owner",
        }
    }

    /// Position of this role in per-role lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Editor => 0,
            Self::Manager => 1,
            Self::Owner => 2,
        }
    }
}

macro_rules! role_text_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownRole;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|role| role.as_str() == s)
                    .ok_or_else(|| UnknownRole {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

role_text_impls!(GlobalRole, "global");
role_text_impls!(SiteRole, "site");
role_text_impls!(PlaceRole, "place");
