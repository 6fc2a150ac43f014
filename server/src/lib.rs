//! Dirhub Server
//!
//! Hierarchical authorization for a multi-tenant directory platform:
//! platform, site, and place roles, with escalation-safe membership management.

pub mod admin;
pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod memberships;
pub mod permissions;
