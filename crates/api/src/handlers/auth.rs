//! Handlers for the signed-in user (login sync, current session).

use axum::extract::State;
use axum::Json;
use mypoems_db::models::user::{UpsertUser, User, UserProfile};
use mypoems_db::repositories::UserRepo;
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::session::Identity;
use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Response for `GET /api/v1/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub logged_in: bool,
    pub user: Option<UserProfile>,
    pub is_admin: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Profile as claimed by the identity provider, without a datastore lookup.
fn profile_from_identity(identity: &Identity) -> UserProfile {
    UserProfile {
        email: identity.email.clone(),
        avatar: identity.picture.clone(),
        first_name: identity.given_name.clone(),
        last_name: identity.family_name.clone(),
    }
}

/// Create the local user for `identity` or refresh its stored profile.
async fn sync_user(pool: &PgPool, identity: &Identity) -> Result<User, sqlx::Error> {
    let input = UpsertUser {
        email: identity.email.clone(),
        avatar_url: identity.picture.clone(),
        first_name: identity.given_name.clone(),
        last_name: identity.family_name.clone(),
    };
    UserRepo::upsert_by_email(pool, &input).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Called by the identity layer after a successful sign-in. Upserts the
/// user by email and returns the stored profile.
pub async fn login(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    let user = sync_user(&state.pool, &auth.identity).await?;

    tracing::info!(user_id = user.id, email = %user.email, "User signed in");

    Ok(Json(DataResponse { data: user.into() }))
}

/// GET /api/v1/me
///
/// Describe the current session. Anonymous callers get `loggedIn: false`.
pub async fn me(MaybeAuthUser(auth): MaybeAuthUser, State(state): State<AppState>) -> Json<MeResponse> {
    let response = match auth {
        Some(user) => MeResponse {
            logged_in: true,
            is_admin: state.config.is_admin_email(user.email()),
            user: Some(profile_from_identity(&user.identity)),
        },
        None => MeResponse {
            logged_in: false,
            user: None,
            is_admin: false,
        },
    };
    Json(response)
}
