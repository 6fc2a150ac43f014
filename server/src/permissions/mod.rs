//! Permission system types and utilities.
//!
//! Three-tier role model:
//! - Platform: a global role per user, gated by per-operation allow-lists
//! - Site: `editor` / `siteadmin` memberships
//! - Place: `editor` / `manager` / `owner` memberships
//!
//! [`PermissionResolver`] answers read/act checks. [`MembershipGuard`] decides
//! who may grant, change, or revoke memberships.

pub mod error;
pub mod guard;
pub mod hierarchy;
pub mod models;
pub mod platform;
pub mod resolver;
pub mod roles;
pub mod store;

pub use error::{AuthzError, DenyReason, StoreError};
pub use guard::{AuthorityBand, MembershipGuard, SiteAuthorityBand, Verdict};
pub use hierarchy::{PlaceRank, RoleHierarchy, SiteRank};
pub use models::*;
pub use platform::{PlatformGate, PlatformOperation};
pub use resolver::PermissionResolver;
pub use roles::{GlobalRole, PlaceRole, SiteRole, UnknownRole};
pub use store::{MembershipStore, SiteStore, UserStore};
