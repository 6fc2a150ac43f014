//! Role rank tables.
//!
//! Ranks are only comparable within a scope kind: `SiteRank` and `PlaceRank`
//! are distinct types, so a site role can never be compared to a place role.

use super::roles::{PlaceRole, SiteRole};

/// Fixed site rank table: `editor < siteadmin`.
const SITE_RANKS: [(SiteRole, u8); 2] = [(SiteRole::Editor, 1), (SiteRole::Siteadmin, 2)];

/// Fixed place rank table: `editor < manager < owner`.
const PLACE_RANKS: [(PlaceRole, u8); 3] = [
    (PlaceRole::Editor, 1),
    (PlaceRole::Manager, 2),
    (PlaceRole::Owner, 3),
];

/// Rank of a site-scope role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteRank(u8);

/// Rank of a place-scope role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceRank(u8);

impl SiteRank {
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl PlaceRank {
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Immutable rank tables, built once at startup and shared via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    site: [SiteRank; SiteRole::ALL.len()],
    place: [PlaceRank; PlaceRole::ALL.len()],
}

impl RoleHierarchy {
    /// Build the hierarchy from the fixed rank tables.
    #[must_use]
    pub fn new() -> Self {
        let mut site = [SiteRank(0); SiteRole::ALL.len()];
        for (role, rank) in SITE_RANKS {
            site[role.index()] = SiteRank(rank);
        }

        let mut place = [PlaceRank(0); PlaceRole::ALL.len()];
        for (role, rank) in PLACE_RANKS {
            place[role.index()] = PlaceRank(rank);
        }

        Self { site, place }
    }

    #[must_use]
    pub const fn site_rank(&self, role: SiteRole) -> SiteRank {
        self.site[role.index()]
    }

    #[must_use]
    pub const fn place_rank(&self, role: PlaceRole) -> PlaceRank {
        self.place[role.index()]
    }

    /// Whether `held` is at or above `required`.
    #[must_use]
    pub fn site_at_least(&self, held: SiteRole, required: SiteRole) -> bool {
        self.site_rank(held) >= self.site_rank(required)
    }

    /// Whether `held` is at or above `required`.
    #[must_use]
    pub fn place_at_least(&self, held: PlaceRole, required: PlaceRole) -> bool {
        self.place_rank(held) >= self.place_rank(required)
    }

    /// The higher-ranked of two place roles.
    #[must_use]
    pub fn place_max(&self, a: PlaceRole, b: PlaceRole) -> PlaceRole {
        if self.place_rank(a) >= self.place_rank(b) {
            a
        } else {
            b
        }
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::new()
    }
}
