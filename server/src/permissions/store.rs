//! Store collaborators consumed by the permission system.
//!
//! Implemented by [`crate::db::PgStore`] and [`crate::db::InMemoryStore`].
//! Uniqueness of `(scope, user)` memberships is the store's job: a duplicate
//! create must fail with [`StoreError::Conflict`] atomically.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{Place, PlaceMembership, Site, SiteMembership};
use super::roles::{GlobalRole, PlaceRole, SiteRole};

/// Lookup and update of a user's platform-wide role.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `None` if the user does not exist.
    async fn find_global_role(&self, user_id: Uuid) -> Result<Option<GlobalRole>, StoreError>;

    /// Fails with [`StoreError::NotFound`] if the user does not exist.
    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> Result<(), StoreError>;
}

/// Scope lookups and membership persistence.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, StoreError>;

    async fn find_place(&self, place_id: Uuid) -> Result<Option<Place>, StoreError>;

    async fn find_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SiteMembership>, StoreError>;

    async fn find_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlaceMembership>, StoreError>;

    async fn list_site_memberships(&self, site_id: Uuid) -> Result<Vec<SiteMembership>, StoreError>;

    async fn list_place_memberships(
        &self,
        place_id: Uuid,
    ) -> Result<Vec<PlaceMembership>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if a membership already exists.
    async fn create_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError>;

    /// Fails with [`StoreError::Conflict`] if a membership already exists.
    async fn create_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError>;

    async fn update_site_membership_role(
        &self,
        membership_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError>;

    async fn update_place_membership_role(
        &self,
        membership_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError>;

    async fn delete_site_membership(&self, membership_id: Uuid) -> Result<(), StoreError>;

    async fn delete_place_membership(&self, membership_id: Uuid) -> Result<(), StoreError>;
}

/// Tenant management for platform-scope endpoints.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn list_sites(&self) -> Result<Vec<Site>, StoreError>;

    async fn create_site(&self, name: &str) -> Result<Site, StoreError>;

    async fn rename_site(&self, site_id: Uuid, name: &str) -> Result<Site, StoreError>;

    /// Memberships of the site and its places are removed with it.
    async fn delete_site(&self, site_id: Uuid) -> Result<(), StoreError>;
}
