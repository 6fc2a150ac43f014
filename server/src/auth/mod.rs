//! Authentication
//!
//! Bearer token validation. Tokens are issued by the identity provider; this
//! service only verifies them and resolves the caller's global role.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use middleware::require_auth;
