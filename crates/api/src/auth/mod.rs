//! Session primitives.
//!
//! - [`session`] -- HS256 session tokens carrying identity-provider claims.

pub mod session;
