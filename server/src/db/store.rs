//! `PostgreSQL` store.
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditEvent, AuditSink};
use crate::permissions::{
    GlobalRole, MembershipStore, Place, PlaceMembership, PlaceRole, Site, SiteMembership,
    SiteRole, SiteStore, StoreError, UserStore,
};

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

/// Map write failures onto the store contract.
///
/// Unique violations become `Conflict`; foreign key violations mean the
/// referenced user or scope does not exist.
fn write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => StoreError::NotFound,
        _ => {
            error!(error = %e, "Database write failed");
            StoreError::Database(e)
        }
    }
}

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_global_role(&self, user_id: Uuid) -> Result<Option<GlobalRole>, StoreError> {
        let role = sqlx::query_scalar::<_, GlobalRole>("SELECT global_role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("find_global_role", user_id = %user_id))?;
        Ok(role)
    }

    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET global_role = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(role)
                .execute(&self.pool)
                .await
                .map_err(db_error!("set_global_role", user_id = %user_id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, StoreError> {
        let site = sqlx::query_as::<_, Site>(
            "SELECT id, name, created_at, updated_at FROM sites WHERE id = $1",
        )
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("find_site", site_id = %site_id))?;
        Ok(site)
    }

    async fn find_place(&self, place_id: Uuid) -> Result<Option<Place>, StoreError> {
        let place =
            sqlx::query_as::<_, Place>("SELECT id, site_id, owner_id FROM places WHERE id = $1")
                .bind(place_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error!("find_place", place_id = %place_id))?;
        Ok(place)
    }

    async fn find_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SiteMembership>, StoreError> {
        let membership = sqlx::query_as::<_, SiteMembership>(
            "SELECT * FROM site_memberships WHERE site_id = $1 AND user_id = $2",
        )
        .bind(site_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("find_site_membership", site_id = %site_id, user_id = %user_id))?;
        Ok(membership)
    }

    async fn find_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlaceMembership>, StoreError> {
        let membership = sqlx::query_as::<_, PlaceMembership>(
            "SELECT * FROM place_memberships WHERE place_id = $1 AND user_id = $2",
        )
        .bind(place_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("find_place_membership", place_id = %place_id, user_id = %user_id))?;
        Ok(membership)
    }

    async fn list_site_memberships(&self, site_id: Uuid) -> Result<Vec<SiteMembership>, StoreError> {
        let memberships = sqlx::query_as::<_, SiteMembership>(
            "SELECT * FROM site_memberships WHERE site_id = $1 ORDER BY created_at, id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_site_memberships", site_id = %site_id))?;
        Ok(memberships)
    }

    async fn list_place_memberships(
        &self,
        place_id: Uuid,
    ) -> Result<Vec<PlaceMembership>, StoreError> {
        let memberships = sqlx::query_as::<_, PlaceMembership>(
            "SELECT * FROM place_memberships WHERE place_id = $1 ORDER BY created_at, id",
        )
        .bind(place_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_place_memberships", place_id = %place_id))?;
        Ok(memberships)
    }

    async fn create_site_membership(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError> {
        sqlx::query_as::<_, SiteMembership>(
            r"
            INSERT INTO site_memberships (id, site_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Uuid::now_v7())
        .bind(site_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn create_place_membership(
        &self,
        place_id: Uuid,
        user_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError> {
        sqlx::query_as::<_, PlaceMembership>(
            r"
            INSERT INTO place_memberships (id, place_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Uuid::now_v7())
        .bind(place_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn update_site_membership_role(
        &self,
        membership_id: Uuid,
        role: SiteRole,
    ) -> Result<SiteMembership, StoreError> {
        sqlx::query_as::<_, SiteMembership>(
            "UPDATE site_memberships SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(membership_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("update_site_membership_role", membership_id = %membership_id))?
        .ok_or(StoreError::NotFound)
    }

    async fn update_place_membership_role(
        &self,
        membership_id: Uuid,
        role: PlaceRole,
    ) -> Result<PlaceMembership, StoreError> {
        sqlx::query_as::<_, PlaceMembership>(
            "UPDATE place_memberships SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(membership_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("update_place_membership_role", membership_id = %membership_id))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_site_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM site_memberships WHERE id = $1")
            .bind(membership_id)
            .execute(&self.pool)
            .await
            .map_err(db_error!("delete_site_membership", membership_id = %membership_id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_place_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM place_memberships WHERE id = $1")
            .bind(membership_id)
            .execute(&self.pool)
            .await
            .map_err(db_error!("delete_place_membership", membership_id = %membership_id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SiteStore for PgStore {
    async fn list_sites(&self) -> Result<Vec<Site>, StoreError> {
        let sites = sqlx::query_as::<_, Site>(
            "SELECT id, name, created_at, updated_at FROM sites ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(query = "list_sites", error = %e, "Database query failed");
            e
        })?;
        Ok(sites)
    }

    async fn create_site(&self, name: &str) -> Result<Site, StoreError> {
        let site = sqlx::query_as::<_, Site>(
            r"
            INSERT INTO sites (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error!("create_site", name = %name))?;
        Ok(site)
    }

    async fn rename_site(&self, site_id: Uuid, name: &str) -> Result<Site, StoreError> {
        sqlx::query_as::<_, Site>(
            r"
            UPDATE sites SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(site_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("rename_site", site_id = %site_id))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_site(&self, site_id: Uuid) -> Result<(), StoreError> {
        // Places and memberships go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(site_id)
            .execute(&self.pool)
            .await
            .map_err(db_error!("delete_site", site_id = %site_id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for PgStore {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let entry = AuditEntry::from_event(event);
        sqlx::query(
            r"
            INSERT INTO audit_log
                (id, actor_id, action, scope_kind, scope_id, target_user_id, role, outcome, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.scope_kind)
        .bind(entry.scope_id)
        .bind(entry.target_user_id)
        .bind(&entry.role)
        .bind(&entry.outcome)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error!("record_audit", action = %entry.action))?;
        Ok(())
    }

    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_id, action, scope_kind, scope_id, target_user_id, role, outcome, reason, created_at
            FROM audit_log
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("recent_audit", limit = limit, offset = offset))?;
        Ok(entries)
    }
}
