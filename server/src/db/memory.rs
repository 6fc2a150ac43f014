//! In-memory store.
//!
//! Nothing is persisted; all data is lost when the process ends. Use this
//! only in development or test contexts.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditEvent, AuditSink};
use crate::permissions::{
    GlobalRole, MembershipStore, Place, PlaceMembership, PlaceRole, Site, SiteMembership,
    SiteRole, SiteStore, StoreError, UserStore,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, GlobalRole>,
    sites: HashMap<Uuid, Site>,
    places: HashMap<Uuid, Place>,
    site_memberships: HashMap<Uuid, SiteMembership>,
    place_memberships: HashMap<Uuid, PlaceMembership>,
    audit_log: VecDeque<AuditEntry>,
}

impl State {
    fn site_membership_by_pair(&self, site_id: Uuid, user_id: Uuid) -> Option<&SiteMembership> {
        self.site_memberships
            .values()
            .find(|m| m.site_id == site_id && m.user_id == user_id)
    }

    fn place_membership_by_pair(&self, place_id: Uuid, user_id: Uuid) -> Option<&PlaceMembership> {
        self.place_memberships
            .values()
            .find(|m| m.place_id == place_id && m.user_id == user_id)
    }
}

/// Audit entries kept by default before the oldest are dropped.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Store keeping every table in a single locked map set.
///
/// Writes take the lock exclusively, so the `(scope, user)` uniqueness check
/// and the insert happen atomically. The audit log is a ring buffer of
/// `audit_capacity` entries.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    audit_capacity: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_audit_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_audit_capacity(audit_capacity: usize) -> Self {
        Self {
            state: Arc::default(),
            audit_capacity,
        }
    }

    /// Register a user with the given global role.
    pub async fn add_user(&self, role: GlobalRole) -> Uuid {
        let id = Uuid::now_v7();
        self.state.write().await.users.insert(id, role);
        id
    }

    /// Register a site.
    pub async fn add_site(&self, name: &str) -> Uuid {
        let site = new_site(name);
        let id = site.id;
        self.state.write().await.sites.insert(id, site);
        id
    }

    /// Register a place under `site_id`, optionally with a denormalized owner.
    pub async fn add_place(&self, site_id: Uuid, owner_id: Option<Uuid>) -> Uuid {
        let id = Uuid::now_v7();
        self.state.write().await.places.insert(
            id,
            Place {
                id,
                site_id,
                owner_id,
            },
        );
        id
    }
}

fn new_site(name: &str) -> Site {
    let now = Utc::now();
    Site {
        id: Uuid::now_v7(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_global_role(&self, user_id: Uuid) -> Result<Option<GlobalRole>, StoreError> {
        Ok(self.state.read().await.users.get(&user_id).copied())
    }

    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let current = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        *current = role;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, StoreError> {
        Ok(self.state.read().await.sites.get(&site_id).cloned())
    }

    async fn find_place(&self, place_id: Uuid) -> Result<Option<Place>, StoreError> {
        Ok(self.state.read().await.places.get(&place_id).copied())
    }

    async fn find_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SiteMembership>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .site_membership_by_pair(site_id, user_id)
            .cloned())
    }

    async fn find_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlaceMembership>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .place_membership_by_pair(place_id, user_id)
            .cloned())
    }

    async fn list_site_memberships(&self, site_id: Uuid) -> Result<Vec<SiteMembership>, StoreError> {
        let state = self.state.read().await;
        let mut memberships: Vec<_> = state
            .site_memberships
            .values()
            .filter(|m| m.site_id == site_id)
            .cloned()
            .collect();
        // v7 ids sort by creation time
        memberships.sort_by_key(|m| m.id);
        Ok(memberships)
    }

    async fn list_place_memberships(
        &self,
        place_id: Uuid,
    ) -> Result<Vec<PlaceMembership>, StoreError> {
        let state = self.state.read().await;
        let mut memberships: Vec<_> = state
            .place_memberships
            .values()
            .filter(|m| m.place_id == place_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|m| m.id);
        Ok(memberships)
    }

    async fn create_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError> {
        let mut state = self.state.write().await;
        if !state.sites.contains_key(&site_id) || !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if state.site_membership_by_pair(site_id, user_id).is_some() {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let membership = SiteMembership {
            id: Uuid::now_v7(),
            site_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };
        state
            .site_memberships
            .insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn create_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError> {
        let mut state = self.state.write().await;
        if !state.places.contains_key(&place_id) || !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if state.place_membership_by_pair(place_id, user_id).is_some() {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let membership = PlaceMembership {
            id: Uuid::now_v7(),
            place_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };
        state
            .place_memberships
            .insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn update_site_membership_role(
        &self,
        membership_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError> {
        let mut state = self.state.write().await;
        let membership = state
            .site_memberships
            .get_mut(&membership_id)
            .ok_or(StoreError::NotFound)?;
        membership.role = role;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn update_place_membership_role(
        &self,
        membership_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError> {
        let mut state = self.state.write().await;
        let membership = state
            .place_memberships
            .get_mut(&membership_id)
            .ok_or(StoreError::NotFound)?;
        membership.role = role;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn delete_site_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .site_memberships
            .remove(&membership_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn delete_place_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .place_memberships
            .remove(&membership_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl SiteStore for InMemoryStore {
    async fn list_sites(&self) -> Result<Vec<Site>, StoreError> {
        let mut sites: Vec<_> = self.state.read().await.sites.values().cloned().collect();
        sites.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(sites)
    }

    async fn create_site(&self, name: &str) -> Result<Site, StoreError> {
        let site = new_site(name);
        self.state
            .write()
            .await
            .sites
            .insert(site.id, site.clone());
        Ok(site)
    }

    async fn rename_site(&self, site_id: Uuid, name: &str) -> Result<Site, StoreError> {
        let mut state = self.state.write().await;
        let site = state.sites.get_mut(&site_id).ok_or(StoreError::NotFound)?;
        site.name = name.to_string();
        site.updated_at = Utc::now();
        Ok(site.clone())
    }

    async fn delete_site(&self, site_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.sites.remove(&site_id).is_none() {
            return Err(StoreError::NotFound);
        }

        state.places.retain(|_, p| p.site_id != site_id);
        let State {
            places,
            site_memberships,
            place_memberships,
            ..
        } = &mut *state;
        site_memberships.retain(|_, m| m.site_id != site_id);
        place_memberships.retain(|_, m| places.contains_key(&m.place_id));
        Ok(())
    }
}

#[async_trait]
impl AuditSink for InMemoryStore {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.audit_log.push_back(AuditEntry::from_event(event));
        while state.audit_log.len() > self.audit_capacity {
            state.audit_log.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let offset = usize::try_from(offset).unwrap_or(0);
        Ok(self
            .state
            .read()
            .await
            .audit_log
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
