//! Permission resolution logic.
//!
//! Answers whether an actor may act at a scope with at least a given role.
//!
//! Resolution order (first match wins):
//! 1. Platform superadmin is allowed everywhere
//! 2. For places, a `siteadmin` of the owning site is allowed
//! 3. Otherwise the actor's membership at the scope must rank at or above
//!    the required role (for places, `Place.owner_id` counts as `owner`)

use std::sync::Arc;

use uuid::Uuid;

use super::error::{AuthzError, DenyReason, StoreError};
use super::hierarchy::RoleHierarchy;
use super::models::{Actor, Place, Requirement};
use super::roles::{PlaceRole, SiteRole};
use super::store::MembershipStore;

/// Read/act permission checks over the membership store.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn MembershipStore>,
    hierarchy: Arc<RoleHierarchy>,
}

impl PermissionResolver {
    #[must_use]
    pub fn new(store: Arc<dyn MembershipStore>, hierarchy: Arc<RoleHierarchy>) -> Self {
        Self { store, hierarchy }
    }

    #[must_use]
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub(crate) fn store(&self) -> &dyn MembershipStore {
        self.store.as_ref()
    }

    /// Check whether `actor` meets `required`.
    ///
    /// A place that does not exist is a plain deny. Store failures propagate.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn check(&self, actor: &Actor, required: Requirement) -> Result<bool, StoreError> {
        if actor.global_role.is_superadmin() {
            return Ok(true);
        }

        let allowed = match required {
            Requirement::Site { site_id, role } => {
                let held = self.site_role(actor.id, site_id).await?;
                held.is_some_and(|held| self.hierarchy.site_at_least(held, role))
            }
            Requirement::Place { place_id, role } => {
                let Some(place) = self.store.find_place(place_id).await? else {
                    tracing::debug!(%place_id, "Place not found, denying");
                    return Ok(false);
                };

                if self.is_site_admin(actor.id, place.site_id).await? {
                    return Ok(true);
                }

                let held = self.place_role(actor.id, &place).await?;
                held.is_some_and(|held| self.hierarchy.place_at_least(held, role))
            }
        };

        Ok(allowed)
    }

    /// Like [`Self::check`], but a deny becomes
    /// `PermissionDenied(InsufficientAuthority)`.
    pub async fn require(&self, actor: &Actor, required: Requirement) -> Result<(), AuthzError> {
        if self.check(actor, required).await? {
            Ok(())
        } else {
            Err(AuthzError::denied(DenyReason::InsufficientAuthority))
        }
    }

    pub(crate) async fn site_role(
        &self,
        user_id: Uuid,
        site_id: Uuid,
    ) -> Result<Option<SiteRole>, StoreError> {
        Ok(self
            .store
            .find_site_membership(site_id, user_id)
            .await?
            .map(|m| m.role))
    }

    pub(crate) async fn is_site_admin(
        &self,
        user_id: Uuid,
        site_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.site_role(user_id, site_id).await? == Some(SiteRole::Siteadmin))
    }

    /// Effective place role: the higher of the explicit membership and the
    /// denormalized owner field.
    pub(crate) async fn place_role(
        &self,
        user_id: Uuid,
        place: &Place,
    ) -> Result<Option<PlaceRole>, StoreError> {
        let membership = self
            .store
            .find_place_membership(place.id, user_id)
            .await?
            .map(|m| m.role);

        let owner_field = (place.owner_id == Some(user_id)).then_some(PlaceRole::Owner);

        Ok(match (membership, owner_field) {
            (Some(a), Some(b)) => Some(self.hierarchy.place_max(a, b)),
            (a, b) => a.or(b),
        })
    }
}
