//! Membership request types.
//!
//! Responses are the membership rows themselves.

use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST .../members`. `R` is the scope's role enum.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest<R> {
    pub user_id: Uuid,
    pub role: R,
}

/// Body of `PATCH .../members/{user_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest<R> {
    pub role: R,
}
