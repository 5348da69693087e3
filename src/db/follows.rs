use sqlx::SqliteExecutor;
use uuid::Uuid;

/// Get-or-create: returns whether a new pair was stored.
pub async fn follow<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid, author_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("INSERT INTO follows (user_id,author_id) VALUES (?,?) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drops the pair if it exists; returns whether anything was removed.
pub async fn unfollow<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid, author_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id=? AND author_id=?")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_following<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid, author_id: Uuid) -> sqlx::Result<bool> {
    Ok(sqlx::query("SELECT 1 FROM follows WHERE user_id=? AND author_id=?")
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(db)
        .await?
        .is_some())
}

pub async fn count_pairs<'e, E: SqliteExecutor<'e>>(db: E, user_id: Uuid, author_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id=? AND author_id=?")
        .bind(user_id)
        .bind(author_id)
        .fetch_one(db)
        .await
}
