use sqlx::SqliteExecutor;
use uuid::Uuid;

use super::Profile;

pub async fn for_user<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid) -> sqlx::Result<Option<Profile>> {
    sqlx::query_as("SELECT id,user_id,avatar FROM profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Creates the user's profile or updates the existing one in a single
/// statement. A `None` avatar keeps whatever is stored.
pub async fn upsert_avatar<'e, E: SqliteExecutor<'e>>(
    db: E,
    user_id: Uuid,
    avatar: Option<&str>,
) -> sqlx::Result<Profile> {
    sqlx::query_as(
        "INSERT INTO profiles (id,user_id,avatar) VALUES (?,?,?)
         ON CONFLICT (user_id) DO UPDATE SET avatar=COALESCE(excluded.avatar, profiles.avatar)
         RETURNING id,user_id,avatar",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(avatar)
    .fetch_one(db)
    .await
}

pub async fn count_for_user<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_one(db)
        .await
}
