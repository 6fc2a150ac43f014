//! Membership management.
//!
//! Runs the guarded mutation sequence for site and place memberships and
//! writes one audit entry per attempt, whatever its outcome.

use std::sync::Arc;

use uuid::Uuid;

use crate::audit::{record_quietly, AuditAction, AuditEvent, AuditOutcome, AuditSink};
use crate::permissions::{
    Actor, AuthzError, MembershipGuard, MembershipStore, PermissionResolver, Place,
    PlaceMembership, PlaceRole, Scope, ScopedRole, Site, SiteMembership, SiteRole, StoreError,
    UserStore,
};

/// Guarded membership operations.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn MembershipStore>,
    users: Arc<dyn UserStore>,
    resolver: Arc<PermissionResolver>,
    guard: Arc<MembershipGuard>,
    audit: Arc<dyn AuditSink>,
}

impl MembershipService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MembershipStore>,
        users: Arc<dyn UserStore>,
        resolver: Arc<PermissionResolver>,
        guard: Arc<MembershipGuard>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            users,
            resolver,
            guard,
            audit,
        }
    }

    // ------------------------------------------------------------------------
    // Site scope
    // ------------------------------------------------------------------------

    /// List a site's members. Requires `editor` on the site.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list_site_members(
        &self,
        actor: &Actor,
        site_id: Uuid,
    ) -> Result<Vec<SiteMembership>, AuthzError> {
        self.require_site(site_id).await?;
        self.resolver
            .require(actor, ScopedRole::site(site_id, SiteRole::Editor))
            .await?;
        Ok(self.store.list_site_memberships(site_id).await?)
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn add_site_member(
        &self,
        actor: &Actor,
        site_id: Uuid,
        user_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, AuthzError> {
        let result: Result<SiteMembership, AuthzError> = async {
            let site = self.require_site(site_id).await?;
            if self
                .store
                .find_site_membership(site_id, user_id)
                .await?
                .is_some()
            {
                return Err(AuthzError::Conflict);
            }
            self.guard
                .assign_site_role_in(actor, &site, role, None)
                .await?;
            self.require_user(user_id).await?;
            match self.store.create_site_membership(site_id, user_id, role).await {
                Ok(membership) => Ok(membership),
                Err(StoreError::NotFound) => {
                    Err(self.missing_after_create(Scope::Site(site_id)).await)
                }
                Err(e) => Err(e.into()),
            }
        }
        .await;

        self.record(
            actor,
            AuditAction::CreateMembership,
            Scope::Site(site_id),
            user_id,
            Some(role.as_str()),
            &result,
        )
        .await;
        result
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn change_site_member_role(
        &self,
        actor: &Actor,
        site_id: Uuid,
        user_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, AuthzError> {
        let result: Result<SiteMembership, AuthzError> = async {
            let (site, existing) = self.existing_site_membership(site_id, user_id).await?;
            self.guard
                .assign_site_role_in(actor, &site, role, Some(existing.role))
                .await?;
            self.store
                .update_site_membership_role(existing.id, role)
                .await
                .map_err(|e| AuthzError::from_store(e, "Membership"))
        }
        .await;

        self.record(
            actor,
            AuditAction::UpdateMembershipRole,
            Scope::Site(site_id),
            user_id,
            Some(role.as_str()),
            &result,
        )
        .await;
        result
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn remove_site_member(
        &self,
        actor: &Actor,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AuthzError> {
        let mut removed_role = None;
        let result: Result<(), AuthzError> = async {
            let (site, existing) = self.existing_site_membership(site_id, user_id).await?;
            removed_role = Some(existing.role.as_str());
            self.guard
                .delete_site_role_in(actor, &site, existing.role)
                .await?;
            self.store
                .delete_site_membership(existing.id)
                .await
                .map_err(|e| AuthzError::from_store(e, "Membership"))
        }
        .await;

        self.record(
            actor,
            AuditAction::DeleteMembership,
            Scope::Site(site_id),
            user_id,
            removed_role,
            &result,
        )
        .await;
        result
    }

    // ------------------------------------------------------------------------
    // Place scope
    // ------------------------------------------------------------------------

    /// List a place's members. Requires `editor` on the place (or bypass).
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list_place_members(
        &self,
        actor: &Actor,
        place_id: Uuid,
    ) -> Result<Vec<PlaceMembership>, AuthzError> {
        self.require_place(place_id).await?;
        self.resolver
            .require(actor, ScopedRole::place(place_id, PlaceRole::Editor))
            .await?;
        Ok(self.store.list_place_memberships(place_id).await?)
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn add_place_member(
        &self,
        actor: &Actor,
        place_id: Uuid,
        user_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, AuthzError> {
        let result: Result<PlaceMembership, AuthzError> = async {
            let place = self.require_place(place_id).await?;
            if self
                .store
                .find_place_membership(place_id, user_id)
                .await?
                .is_some()
            {
                return Err(AuthzError::Conflict);
            }
            self.guard
                .assign_place_role_in(actor, &place, role, None)
                .await?;
            self.require_user(user_id).await?;
            match self.store.create_place_membership(place_id, user_id, role).await {
                Ok(membership) => Ok(membership),
                Err(StoreError::NotFound) => {
                    Err(self.missing_after_create(Scope::Place(place_id)).await)
                }
                Err(e) => Err(e.into()),
            }
        }
        .await;

        self.record(
            actor,
            AuditAction::CreateMembership,
            Scope::Place(place_id),
            user_id,
            Some(role.as_str()),
            &result,
        )
        .await;
        result
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn change_place_member_role(
        &self,
        actor: &Actor,
        place_id: Uuid,
        user_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, AuthzError> {
        let result: Result<PlaceMembership, AuthzError> = async {
            let (place, existing) = self.existing_place_membership(place_id, user_id).await?;
            self.guard
                .assign_place_role_in(actor, &place, role, Some(existing.role))
                .await?;
            self.store
                .update_place_membership_role(existing.id, role)
                .await
                .map_err(|e| AuthzError::from_store(e, "Membership"))
        }
        .await;

        self.record(
            actor,
            AuditAction::UpdateMembershipRole,
            Scope::Place(place_id),
            user_id,
            Some(role.as_str()),
            &result,
        )
        .await;
        result
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn remove_place_member(
        &self,
        actor: &Actor,
        place_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AuthzError> {
        let mut removed_role = None;
        let result: Result<(), AuthzError> = async {
            let (place, existing) = self.existing_place_membership(place_id, user_id).await?;
            removed_role = Some(existing.role.as_str());
            self.guard
                .delete_place_role_in(actor, &place, existing.role)
                .await?;
            self.store
                .delete_place_membership(existing.id)
                .await
                .map_err(|e| AuthzError::from_store(e, "Membership"))
        }
        .await;

        self.record(
            actor,
            AuditAction::DeleteMembership,
            Scope::Place(place_id),
            user_id,
            removed_role,
            &result,
        )
        .await;
        result
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn require_site(&self, site_id: Uuid) -> Result<Site, AuthzError> {
        self.store
            .find_site(site_id)
            .await?
            .ok_or(AuthzError::NotFound("Site"))
    }

    async fn require_place(&self, place_id: Uuid) -> Result<Place, AuthzError> {
        self.store
            .find_place(place_id)
            .await?
            .ok_or(AuthzError::NotFound("Place"))
    }

    /// Name the row a create lost to a concurrent delete: the scope if it is
    /// gone, otherwise the target user.
    async fn missing_after_create(&self, scope: Scope) -> AuthzError {
        let found = match scope {
            Scope::Site(id) => self.store.find_site(id).await.map(|s| s.is_some()),
            Scope::Place(id) => self.store.find_place(id).await.map(|p| p.is_some()),
        };
        match found {
            Ok(true) => AuthzError::NotFound("User"),
            Ok(false) => AuthzError::NotFound(match scope {
                Scope::Site(_) => "Site",
                Scope::Place(_) => "Place",
            }),
            Err(e) => e.into(),
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<(), AuthzError> {
        self.users
            .find_global_role(user_id)
            .await?
            .map(|_| ())
            .ok_or(AuthzError::NotFound("User"))
    }

    async fn existing_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Site, SiteMembership), AuthzError> {
        let site = self.require_site(site_id).await?;
        let membership = self
            .store
            .find_site_membership(site_id, user_id)
            .await?
            .ok_or(AuthzError::NotFound("Membership"))?;
        Ok((site, membership))
    }

    async fn existing_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Place, PlaceMembership), AuthzError> {
        let place = self.require_place(place_id).await?;
        let membership = self
            .store
            .find_place_membership(place_id, user_id)
            .await?
            .ok_or(AuthzError::NotFound("Membership"))?;
        Ok((place, membership))
    }

    async fn record<T>(
        &self,
        actor: &Actor,
        action: AuditAction,
        scope: Scope,
        target_user_id: Uuid,
        role: Option<&'static str>,
        result: &Result<T, AuthzError>,
    ) {
        record_quietly(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: actor.id,
                action,
                scope: Some(scope),
                target_user_id: Some(target_user_id),
                role,
                outcome: AuditOutcome::of(result),
            },
        )
        .await;
    }
}
