//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the signed-in user from a session Bearer token.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous callers pass through.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN_EMAIL` account.

pub mod auth;
pub mod rbac;
