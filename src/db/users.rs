use sqlx::SqliteExecutor;
use uuid::Uuid;

use super::{User, now};

pub async fn create<'e, E: SqliteExecutor<'e>>(
    db: E,
    username: &str,
    email: &str,
    password_hash: &str,
) -> sqlx::Result<User> {
    sqlx::query_as(
        "INSERT INTO users (id,username,email,password_hash,created_at) VALUES (?,?,?,?,?)
         RETURNING id,username,email,password_hash,created_at",
    )
    .bind(Uuid::now_v7())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(now())
    .fetch_one(db)
    .await
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT id,username,email,password_hash,created_at FROM users WHERE id=?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn by_username<'e, E: SqliteExecutor<'e>>(
    db: E,
    username: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT id,username,email,password_hash,created_at FROM users WHERE username=?")
        .bind(username)
        .fetch_optional(db)
        .await
}

pub async fn username_taken<'e, E: SqliteExecutor<'e>>(db: E, username: &str) -> sqlx::Result<bool> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE username=?")
        .bind(username)
        .fetch_optional(db)
        .await?
        .is_some())
}

/// Removes the user; posts, comments, follows and profile go with it.
pub async fn delete<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id=?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
