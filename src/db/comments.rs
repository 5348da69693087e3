use sqlx::SqliteExecutor;
use uuid::Uuid;

use super::{Comment, now};

pub async fn create<'e, E: SqliteExecutor<'e>>(
    db: E,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> sqlx::Result<Uuid> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO comments (id,post_id,author_id,text,created_at) VALUES (?,?,?,?,?)")
        .bind(id)
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(now())
        .execute(db)
        .await?;
    Ok(id)
}

/// Comments on a post, newest first.
pub async fn for_post<'e, E: SqliteExecutor<'e>>(db: E, post_id: Uuid) -> sqlx::Result<Vec<Comment>> {
    sqlx::query_as(
        "SELECT c.id,c.post_id,c.author_id,u.username AS author,c.text,c.created_at
         FROM comments c JOIN users u ON u.id=c.author_id
         WHERE c.post_id=?
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(post_id)
    .fetch_all(db)
    .await
}
