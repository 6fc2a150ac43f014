//! Escalation prevention for membership mutation.
//!
//! Being able to act on a place does not imply being able to manage who else
//! can. Every create, role update, and delete of a membership row is decided
//! by the actor's authority band and two data tables:
//!
//! - the *grant* table, indexed by the role being handed out
//! - the *touch* table, indexed by the role the existing row already holds
//!
//! The touch verdict is evaluated first, so a manager deleting an owner row
//! gets `CannotModifyOwner` rather than `CannotAssignOwner`.

use std::sync::Arc;

use uuid::Uuid;

use super::error::{AuthzError, DenyReason};
use super::models::{Actor, Place, RoleChange, ScopedRole, Site};
use super::resolver::PermissionResolver;
use super::roles::{PlaceRole, SiteRole};

/// Outcome of a single table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    fn into_result(self) -> Result<(), AuthzError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AuthzError::denied(reason)),
        }
    }
}

const ALLOW: Verdict = Verdict::Allow;
const INSUFFICIENT: Verdict = Verdict::Deny(DenyReason::InsufficientAuthority);
const NO_ASSIGN_OWNER: Verdict = Verdict::Deny(DenyReason::CannotAssignOwner);
const NO_MODIFY_OWNER: Verdict = Verdict::Deny(DenyReason::CannotModifyOwner);

/// Effective authority of an actor at a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorityBand {
    /// Platform superadmin or site admin of the owning site.
    Bypass,
    Owner,
    Manager,
    Editor,
    NoAuthority,
}

impl AuthorityBand {
    pub const ALL: [Self; 5] = [
        Self::Bypass,
        Self::Owner,
        Self::Manager,
        Self::Editor,
        Self::NoAuthority,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Bypass => 0,
            Self::Owner => 1,
            Self::Manager => 2,
            Self::Editor => 3,
            Self::NoAuthority => 4,
        }
    }

    const fn from_place_role(role: Option<PlaceRole>) -> Self {
        match role {
            Some(PlaceRole::Owner) => Self::Owner,
            Some(PlaceRole::Manager) => Self::Manager,
            Some(PlaceRole::Editor) => Self::Editor,
            None => Self::NoAuthority,
        }
    }
}

/// Effective authority of an actor at a site. There is no manager tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteAuthorityBand {
    /// Platform superadmin.
    Bypass,
    SiteAdmin,
    Editor,
    NoAuthority,
}

impl SiteAuthorityBand {
    pub const ALL: [Self; 4] = [Self::Bypass, Self::SiteAdmin, Self::Editor, Self::NoAuthority];

    const fn index(self) -> usize {
        match self {
            Self::Bypass => 0,
            Self::SiteAdmin => 1,
            Self::Editor => 2,
            Self::NoAuthority => 3,
        }
    }

    const fn from_site_role(role: Option<SiteRole>) -> Self {
        match role {
            Some(SiteRole::Siteadmin) => Self::SiteAdmin,
            Some(SiteRole::Editor) => Self::Editor,
            None => Self::NoAuthority,
        }
    }
}

/// Escalation rules for one scope kind.
///
/// `B` rows are authority bands, `R` columns are roles of that scope.
#[derive(Debug)]
pub struct DecisionTable<const B: usize, const R: usize> {
    grant: [[Verdict; R]; B],
    touch: [[Verdict; R]; B],
}

impl<const B: usize, const R: usize> DecisionTable<B, R> {
    /// Verdict for handing out role column `target`.
    const fn grant(&self, band: usize, target: usize) -> Verdict {
        self.grant[band][target]
    }

    /// Verdict for changing or removing a row currently at role column `current`.
    const fn touch(&self, band: usize, current: usize) -> Verdict {
        self.touch[band][current]
    }

    fn decide(&self, band: usize, target: usize, current: Option<usize>) -> Verdict {
        if let Some(current) = current {
            let verdict = self.touch(band, current);
            if verdict != ALLOW {
                return verdict;
            }
        }
        self.grant(band, target)
    }
}

/// Place matrix. Columns: editor, manager, owner.
pub static PLACE_TABLE: DecisionTable<5, 3> = DecisionTable {
    grant: [
        /* bypass       */ [ALLOW, ALLOW, ALLOW],
        /* owner        */ [ALLOW, ALLOW, ALLOW],
        /* manager      */ [ALLOW, ALLOW, NO_ASSIGN_OWNER],
        /* editor       */ [INSUFFICIENT; 3],
        /* no authority */ [INSUFFICIENT; 3],
    ],
    touch: [
        /* bypass       */ [ALLOW, ALLOW, ALLOW],
        /* owner        */ [ALLOW, ALLOW, ALLOW],
        /* manager      */ [ALLOW, ALLOW, NO_MODIFY_OWNER],
        /* editor       */ [INSUFFICIENT; 3],
        /* no authority */ [INSUFFICIENT; 3],
    ],
};

/// Site matrix. Columns: editor, siteadmin.
pub static SITE_TABLE: DecisionTable<4, 2> = DecisionTable {
    grant: [
        /* bypass       */ [ALLOW, ALLOW],
        /* siteadmin    */ [ALLOW, NO_ASSIGN_OWNER],
        /* editor       */ [INSUFFICIENT; 2],
        /* no authority */ [INSUFFICIENT; 2],
    ],
    touch: [
        /* bypass       */ [ALLOW, ALLOW],
        /* siteadmin    */ [ALLOW, NO_MODIFY_OWNER],
        /* editor       */ [INSUFFICIENT; 2],
        /* no authority */ [INSUFFICIENT; 2],
    ],
};

/// Pure place decision, exposed so the matrix can be enumerated directly.
#[must_use]
pub fn place_verdict(
    band: AuthorityBand,
    target: PlaceRole,
    current: Option<PlaceRole>,
) -> Verdict {
    PLACE_TABLE.decide(band.index(), target.index(), current.map(PlaceRole::index))
}

/// Pure site decision, exposed so the matrix can be enumerated directly.
#[must_use]
pub fn site_verdict(
    band: SiteAuthorityBand,
    target: SiteRole,
    current: Option<SiteRole>,
) -> Verdict {
    SITE_TABLE.decide(band.index(), target.index(), current.map(SiteRole::index))
}

/// Guards membership mutation against privilege escalation.
#[derive(Clone)]
pub struct MembershipGuard {
    resolver: Arc<PermissionResolver>,
}

impl MembershipGuard {
    #[must_use]
    pub const fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve the actor's band at a place.
    ///
    /// Fails with `NotFound` if the place does not exist, for every actor.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn place_authority(
        &self,
        actor: &Actor,
        place_id: Uuid,
    ) -> Result<AuthorityBand, AuthzError> {
        let place = self
            .resolver
            .store()
            .find_place(place_id)
            .await?
            .ok_or(AuthzError::NotFound("Place"))?;
        self.place_authority_in(actor, &place).await
    }

    /// Band at a place the caller has already loaded.
    pub async fn place_authority_in(
        &self,
        actor: &Actor,
        place: &Place,
    ) -> Result<AuthorityBand, AuthzError> {
        if actor.global_role.is_superadmin() {
            return Ok(AuthorityBand::Bypass);
        }

        if self.resolver.is_site_admin(actor.id, place.site_id).await? {
            return Ok(AuthorityBand::Bypass);
        }

        let role = self.resolver.place_role(actor.id, place).await?;
        Ok(AuthorityBand::from_place_role(role))
    }

    /// Resolve the actor's band at a site.
    ///
    /// Fails with `NotFound` if the site does not exist.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn site_authority(
        &self,
        actor: &Actor,
        site_id: Uuid,
    ) -> Result<SiteAuthorityBand, AuthzError> {
        let site = self
            .resolver
            .store()
            .find_site(site_id)
            .await?
            .ok_or(AuthzError::NotFound("Site"))?;
        self.site_authority_in(actor, &site).await
    }

    /// Band at a site the caller has already loaded.
    pub async fn site_authority_in(
        &self,
        actor: &Actor,
        site: &Site,
    ) -> Result<SiteAuthorityBand, AuthzError> {
        if actor.global_role.is_superadmin() {
            return Ok(SiteAuthorityBand::Bypass);
        }

        let role = self.resolver.site_role(actor.id, site.id).await?;
        Ok(SiteAuthorityBand::from_site_role(role))
    }

    /// May `actor` give someone `target` at the place, replacing `current`?
    pub async fn assign_place_role(
        &self,
        actor: &Actor,
        place_id: Uuid,
        target: PlaceRole,
        current: Option<PlaceRole>,
    ) -> Result<(), AuthzError> {
        let band = self.place_authority(actor, place_id).await?;
        decide_place(actor, place_id, band, target, current)
    }

    /// [`Self::assign_place_role`] against a place the caller has already loaded.
    pub async fn assign_place_role_in(
        &self,
        actor: &Actor,
        place: &Place,
        target: PlaceRole,
        current: Option<PlaceRole>,
    ) -> Result<(), AuthzError> {
        let band = self.place_authority_in(actor, place).await?;
        decide_place(actor, place.id, band, target, current)
    }

    /// May `actor` remove a place membership currently at `current`?
    pub async fn delete_place_role(
        &self,
        actor: &Actor,
        place_id: Uuid,
        current: PlaceRole,
    ) -> Result<(), AuthzError> {
        self.assign_place_role(actor, place_id, current, Some(current))
            .await
    }

    pub async fn delete_place_role_in(
        &self,
        actor: &Actor,
        place: &Place,
        current: PlaceRole,
    ) -> Result<(), AuthzError> {
        self.assign_place_role_in(actor, place, current, Some(current))
            .await
    }

    /// May `actor` give someone `target` at the site, replacing `current`?
    pub async fn assign_site_role(
        &self,
        actor: &Actor,
        site_id: Uuid,
        target: SiteRole,
        current: Option<SiteRole>,
    ) -> Result<(), AuthzError> {
        let band = self.site_authority(actor, site_id).await?;
        decide_site(actor, site_id, band, target, current)
    }

    /// [`Self::assign_site_role`] against a site the caller has already loaded.
    pub async fn assign_site_role_in(
        &self,
        actor: &Actor,
        site: &Site,
        target: SiteRole,
        current: Option<SiteRole>,
    ) -> Result<(), AuthzError> {
        let band = self.site_authority_in(actor, site).await?;
        decide_site(actor, site.id, band, target, current)
    }

    /// May `actor` remove a site membership currently at `current`?
    pub async fn delete_site_role(
        &self,
        actor: &Actor,
        site_id: Uuid,
        current: SiteRole,
    ) -> Result<(), AuthzError> {
        self.assign_site_role(actor, site_id, current, Some(current))
            .await
    }

    pub async fn delete_site_role_in(
        &self,
        actor: &Actor,
        site: &Site,
        current: SiteRole,
    ) -> Result<(), AuthzError> {
        self.assign_site_role_in(actor, site, current, Some(current))
            .await
    }

    /// Scope-dispatching form of the assign checks.
    pub async fn assign_role(&self, actor: &Actor, change: RoleChange) -> Result<(), AuthzError> {
        match change {
            RoleChange::Site {
                site_id,
                target,
                current,
            } => self.assign_site_role(actor, site_id, target, current).await,
            RoleChange::Place {
                place_id,
                target,
                current,
            } => {
                self.assign_place_role(actor, place_id, target, current)
                    .await
            }
        }
    }

    /// Scope-dispatching form of the delete checks.
    pub async fn delete_role(&self, actor: &Actor, existing: ScopedRole) -> Result<(), AuthzError> {
        match existing {
            ScopedRole::Site { site_id, role } => self.delete_site_role(actor, site_id, role).await,
            ScopedRole::Place { place_id, role } => {
                self.delete_place_role(actor, place_id, role).await
            }
        }
    }
}

fn decide_place(
    actor: &Actor,
    place_id: Uuid,
    band: AuthorityBand,
    target: PlaceRole,
    current: Option<PlaceRole>,
) -> Result<(), AuthzError> {
    let verdict = place_verdict(band, target, current);
    log_verdict(actor, "place", place_id, target.as_str(), verdict);
    verdict.into_result()
}

fn decide_site(
    actor: &Actor,
    site_id: Uuid,
    band: SiteAuthorityBand,
    target: SiteRole,
    current: Option<SiteRole>,
) -> Result<(), AuthzError> {
    let verdict = site_verdict(band, target, current);
    log_verdict(actor, "site", site_id, target.as_str(), verdict);
    verdict.into_result()
}

fn log_verdict(actor: &Actor, scope_kind: &str, scope_id: Uuid, role: &str, verdict: Verdict) {
    if let Verdict::Deny(reason) = verdict {
        tracing::warn!(
            actor_id = %actor.id,
            scope_kind,
            %scope_id,
            role,
            %reason,
            "Membership change denied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::permissions::hierarchy::RoleHierarchy;
    use crate::permissions::roles::GlobalRole;
    use crate::permissions::store::{MembershipStore, SiteStore};

    // ------------------------------------------------------------------
    // Matrix
    // ------------------------------------------------------------------

    #[test]
    fn test_bypass_and_owner_may_do_anything_at_place() {
        for band in [AuthorityBand::Bypass, AuthorityBand::Owner] {
            for target in PlaceRole::ALL {
                assert_eq!(place_verdict(band, target, None), Verdict::Allow);
                for current in PlaceRole::ALL {
                    assert_eq!(place_verdict(band, target, Some(current)), Verdict::Allow);
                }
            }
        }
    }

    #[test]
    fn test_manager_row_of_place_matrix() {
        let m = AuthorityBand::Manager;
        assert_eq!(place_verdict(m, PlaceRole::Editor, None), Verdict::Allow);
        assert_eq!(place_verdict(m, PlaceRole::Manager, None), Verdict::Allow);
        assert_eq!(
            place_verdict(m, PlaceRole::Manager, Some(PlaceRole::Editor)),
            Verdict::Allow
        );
        assert_eq!(
            place_verdict(m, PlaceRole::Owner, None),
            Verdict::Deny(DenyReason::CannotAssignOwner)
        );
        assert_eq!(
            place_verdict(m, PlaceRole::Owner, Some(PlaceRole::Editor)),
            Verdict::Deny(DenyReason::CannotAssignOwner)
        );

        // Touching an owner row is refused whatever the target, even unchanged.
        for target in PlaceRole::ALL {
            assert_eq!(
                place_verdict(m, target, Some(PlaceRole::Owner)),
                Verdict::Deny(DenyReason::CannotModifyOwner)
            );
        }
    }

    #[test]
    fn test_editor_and_outsider_always_insufficient_at_place() {
        for band in [AuthorityBand::Editor, AuthorityBand::NoAuthority] {
            for target in PlaceRole::ALL {
                let currents = PlaceRole::ALL.map(Some);
                for current in currents.into_iter().chain([None]) {
                    assert_eq!(
                        place_verdict(band, target, current),
                        Verdict::Deny(DenyReason::InsufficientAuthority)
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_band_below_bypass_can_grant_above_itself() {
        let h = RoleHierarchy::new();
        let own_role = |band: AuthorityBand| match band {
            AuthorityBand::Owner => Some(PlaceRole::Owner),
            AuthorityBand::Manager => Some(PlaceRole::Manager),
            AuthorityBand::Editor => Some(PlaceRole::Editor),
            AuthorityBand::Bypass | AuthorityBand::NoAuthority => None,
        };

        for band in AuthorityBand::ALL {
            if band == AuthorityBand::Bypass {
                continue;
            }
            for target in PlaceRole::ALL {
                if place_verdict(band, target, None) == Verdict::Allow {
                    let held = own_role(band).expect("allowed band must hold a role");
                    assert!(h.place_at_least(held, target), "{band:?} granted {target:?}");
                }
            }
        }
    }

    #[test]
    fn test_site_matrix() {
        use SiteAuthorityBand as B;

        for target in SiteRole::ALL {
            assert_eq!(site_verdict(B::Bypass, target, None), Verdict::Allow);
            assert_eq!(
                site_verdict(B::Bypass, target, Some(SiteRole::Siteadmin)),
                Verdict::Allow
            );
        }

        assert_eq!(
            site_verdict(B::SiteAdmin, SiteRole::Editor, None),
            Verdict::Allow
        );
        assert_eq!(
            site_verdict(B::SiteAdmin, SiteRole::Editor, Some(SiteRole::Editor)),
            Verdict::Allow
        );
        assert_eq!(
            site_verdict(B::SiteAdmin, SiteRole::Siteadmin, None),
            Verdict::Deny(DenyReason::CannotAssignOwner)
        );
        assert_eq!(
            site_verdict(B::SiteAdmin, SiteRole::Editor, Some(SiteRole::Siteadmin)),
            Verdict::Deny(DenyReason::CannotModifyOwner)
        );

        for band in [B::Editor, B::NoAuthority] {
            for target in SiteRole::ALL {
                assert_eq!(
                    site_verdict(band, target, None),
                    Verdict::Deny(DenyReason::InsufficientAuthority)
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Band resolution and guarded operations
    // ------------------------------------------------------------------

    struct Fixture {
        store: Arc<InMemoryStore>,
        guard: MembershipGuard,
        site_id: Uuid,
        place_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let site_id = store.add_site("Riverside").await;
        let place_id = store.add_place(site_id, None).await;
        let resolver = PermissionResolver::new(store.clone(), Arc::new(RoleHierarchy::new()));
        Fixture {
            store,
            guard: MembershipGuard::new(Arc::new(resolver)),
            site_id,
            place_id,
        }
    }

    impl Fixture {
        async fn place_member(&self, role: PlaceRole) -> Actor {
            let id = self.store.add_user(GlobalRole::Viewer).await;
            self.store
                .create_place_membership(self.place_id, id, role)
                .await
                .unwrap();
            Actor::new(id, GlobalRole::Viewer)
        }

        async fn site_member(&self, role: SiteRole) -> Actor {
            let id = self.store.add_user(GlobalRole::Editor).await;
            self.store
                .create_site_membership(self.site_id, id, role)
                .await
                .unwrap();
            Actor::new(id, GlobalRole::Editor)
        }
    }

    fn reason(result: Result<(), AuthzError>) -> Option<DenyReason> {
        result.err().and_then(|e| e.deny_reason())
    }

    #[tokio::test]
    async fn test_band_resolution() {
        let f = fixture().await;

        let superadmin = Actor::new(Uuid::new_v4(), GlobalRole::Superadmin);
        assert_eq!(
            f.guard.place_authority(&superadmin, f.place_id).await.unwrap(),
            AuthorityBand::Bypass
        );

        let site_admin = f.site_member(SiteRole::Siteadmin).await;
        assert_eq!(
            f.guard.place_authority(&site_admin, f.place_id).await.unwrap(),
            AuthorityBand::Bypass
        );

        let site_editor = f.site_member(SiteRole::Editor).await;
        assert_eq!(
            f.guard.place_authority(&site_editor, f.place_id).await.unwrap(),
            AuthorityBand::NoAuthority
        );

        for (role, band) in [
            (PlaceRole::Owner, AuthorityBand::Owner),
            (PlaceRole::Manager, AuthorityBand::Manager),
            (PlaceRole::Editor, AuthorityBand::Editor),
        ] {
            let member = f.place_member(role).await;
            assert_eq!(
                f.guard.place_authority(&member, f.place_id).await.unwrap(),
                band
            );
        }
    }

    #[tokio::test]
    async fn test_owner_field_resolves_to_owner_band() {
        let f = fixture().await;
        let owner_id = f.store.add_user(GlobalRole::Viewer).await;
        let place = f.store.add_place(f.site_id, Some(owner_id)).await;
        let actor = Actor::new(owner_id, GlobalRole::Viewer);

        assert_eq!(
            f.guard.place_authority(&actor, place).await.unwrap(),
            AuthorityBand::Owner
        );
    }

    #[tokio::test]
    async fn test_unknown_scope_is_not_found() {
        let f = fixture().await;
        let actor = f.place_member(PlaceRole::Owner).await;

        let err = f
            .guard
            .assign_place_role(&actor, Uuid::new_v4(), PlaceRole::Editor, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound("Place")));

        let err = f
            .guard
            .assign_site_role(&actor, Uuid::new_v4(), SiteRole::Editor, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound("Site")));
    }

    #[tokio::test]
    async fn test_preloaded_scope_is_not_fetched_again() {
        let f = fixture().await;
        let owner_id = f.store.add_user(GlobalRole::Viewer).await;
        let place_id = f.store.add_place(f.site_id, Some(owner_id)).await;
        let place = f.store.find_place(place_id).await.unwrap().unwrap();
        let site = f.store.find_site(f.site_id).await.unwrap().unwrap();
        let owner = Actor::new(owner_id, GlobalRole::Viewer);
        let superadmin = Actor::new(Uuid::new_v4(), GlobalRole::Superadmin);

        // The loaded rows outlive the stored ones
        f.store.delete_site(f.site_id).await.unwrap();

        f.guard
            .assign_place_role_in(&owner, &place, PlaceRole::Owner, None)
            .await
            .unwrap();
        f.guard
            .delete_site_role_in(&superadmin, &site, SiteRole::Siteadmin)
            .await
            .unwrap();
        assert!(matches!(
            f.guard
                .assign_place_role(&owner, place_id, PlaceRole::Owner, None)
                .await,
            Err(AuthzError::NotFound("Place"))
        ));

        let manager = Actor::new(Uuid::new_v4(), GlobalRole::Viewer);
        let result = f
            .guard
            .delete_place_role_in(&manager, &place, PlaceRole::Owner)
            .await;
        assert_eq!(reason(result), Some(DenyReason::InsufficientAuthority));
    }

    #[tokio::test]
    async fn test_manager_cannot_assign_owner() {
        let f = fixture().await;
        let manager = f.place_member(PlaceRole::Manager).await;

        let result = f
            .guard
            .assign_place_role(&manager, f.place_id, PlaceRole::Owner, None)
            .await;
        assert_eq!(reason(result), Some(DenyReason::CannotAssignOwner));
    }

    #[tokio::test]
    async fn test_manager_cannot_delete_owner_but_owner_can() {
        let f = fixture().await;
        let manager = f.place_member(PlaceRole::Manager).await;
        let owner = f.place_member(PlaceRole::Owner).await;

        let result = f
            .guard
            .delete_place_role(&manager, f.place_id, PlaceRole::Owner)
            .await;
        assert_eq!(reason(result), Some(DenyReason::CannotModifyOwner));

        f.guard
            .delete_place_role(&owner, f.place_id, PlaceRole::Owner)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_manager_manages_lower_rows() {
        let f = fixture().await;
        let manager = f.place_member(PlaceRole::Manager).await;

        f.guard
            .assign_place_role(&manager, f.place_id, PlaceRole::Editor, None)
            .await
            .unwrap();
        f.guard
            .assign_place_role(
                &manager,
                f.place_id,
                PlaceRole::Manager,
                Some(PlaceRole::Editor),
            )
            .await
            .unwrap();
        f.guard
            .delete_place_role(&manager, f.place_id, PlaceRole::Manager)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_outsider_has_insufficient_authority() {
        let f = fixture().await;
        let outsider = Actor::new(
            f.store.add_user(GlobalRole::Editor).await,
            GlobalRole::Editor,
        );

        let result = f
            .guard
            .assign_place_role(&outsider, f.place_id, PlaceRole::Editor, None)
            .await;
        assert_eq!(reason(result), Some(DenyReason::InsufficientAuthority));
    }

    #[tokio::test]
    async fn test_place_editor_has_insufficient_authority() {
        let f = fixture().await;
        let editor = f.place_member(PlaceRole::Editor).await;

        let result = f
            .guard
            .delete_place_role(&editor, f.place_id, PlaceRole::Editor)
            .await;
        assert_eq!(reason(result), Some(DenyReason::InsufficientAuthority));
    }

    #[tokio::test]
    async fn test_site_admin_may_assign_place_owner() {
        let f = fixture().await;
        let site_admin = f.site_member(SiteRole::Siteadmin).await;

        f.guard
            .assign_place_role(&site_admin, f.place_id, PlaceRole::Owner, None)
            .await
            .unwrap();
        f.guard
            .delete_place_role(&site_admin, f.place_id, PlaceRole::Owner)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_only_superadmin_manages_siteadmin() {
        let f = fixture().await;
        let site_admin = f.site_member(SiteRole::Siteadmin).await;
        let superadmin = Actor::new(Uuid::new_v4(), GlobalRole::Superadmin);

        let result = f
            .guard
            .assign_site_role(&site_admin, f.site_id, SiteRole::Siteadmin, None)
            .await;
        assert_eq!(reason(result), Some(DenyReason::CannotAssignOwner));

        let result = f
            .guard
            .delete_site_role(&site_admin, f.site_id, SiteRole::Siteadmin)
            .await;
        assert_eq!(reason(result), Some(DenyReason::CannotModifyOwner));

        f.guard
            .assign_site_role(&site_admin, f.site_id, SiteRole::Editor, None)
            .await
            .unwrap();
        f.guard
            .delete_site_role(&site_admin, f.site_id, SiteRole::Editor)
            .await
            .unwrap();

        f.guard
            .assign_site_role(&superadmin, f.site_id, SiteRole::Siteadmin, None)
            .await
            .unwrap();
        f.guard
            .delete_site_role(&superadmin, f.site_id, SiteRole::Siteadmin)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_global_admin_without_membership_has_no_site_authority() {
        let f = fixture().await;
        let admin = Actor::new(f.store.add_user(GlobalRole::Admin).await, GlobalRole::Admin);

        let result = f
            .guard
            .assign_site_role(&admin, f.site_id, SiteRole::Editor, None)
            .await;
        assert_eq!(reason(result), Some(DenyReason::InsufficientAuthority));
    }

    #[tokio::test]
    async fn test_dispatching_forms() {
        let f = fixture().await;
        let manager = f.place_member(PlaceRole::Manager).await;

        let change = RoleChange::Place {
            place_id: f.place_id,
            target: PlaceRole::Owner,
            current: None,
        };
        assert_eq!(
            reason(f.guard.assign_role(&manager, change).await),
            Some(DenyReason::CannotAssignOwner)
        );

        let existing = ScopedRole::place(f.place_id, PlaceRole::Owner);
        assert_eq!(
            reason(f.guard.delete_role(&manager, existing).await),
            Some(DenyReason::CannotModifyOwner)
        );

        let existing = ScopedRole::site(f.site_id, SiteRole::Editor);
        assert_eq!(
            reason(f.guard.delete_role(&manager, existing).await),
            Some(DenyReason::InsufficientAuthority)
        );
    }
}
