//! Repository for the `users` table.

use sqlx::PgPool;

use crate::models::user::{UpsertUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, avatar_url, first_name, last_name, created_at";

/// Provides lookup and upsert operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user or refresh the stored profile of an existing one.
    ///
    /// Keyed by email. Profile fields present in `input` replace the stored
    /// values; absent ones leave them as they are.
    pub async fn upsert_by_email(pool: &PgPool, input: &UpsertUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, avatar_url, first_name, last_name, created_at)
             VALUES ($1, $2, $3, $4, NOW())
             ON CONFLICT (email) DO UPDATE SET
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                last_name = COALESCE(EXCLUDED.last_name, users.last_name)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.avatar_url)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
