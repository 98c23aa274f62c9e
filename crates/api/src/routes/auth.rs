//! Route definitions for the signed-in user.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /login           -> login
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(auth::login))
}

/// Session routes mounted at the API root.
///
/// ```text
/// GET    /me              -> me
/// ```
pub fn session_router() -> Router<AppState> {
    Router::new().route("/me", get(auth::me))
}
