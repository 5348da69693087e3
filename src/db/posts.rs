use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{Post, now};

macro_rules! select_posts {
    () => {
        "SELECT p.id,p.text,p.created_at,p.author_id,u.username AS author,
            p.group_id,g.slug AS group_slug,g.title AS group_title,p.image
        FROM posts p
        JOIN users u ON u.id=p.author_id
        LEFT JOIN post_groups g ON g.id=p.group_id"
    };
}

const NEWEST_FIRST: &str = " ORDER BY p.created_at DESC, p.id DESC";

/// Which posts a listing shows.
#[derive(Debug, Clone)]
pub enum Feed {
    /// Everything, optionally narrowed by a search keyword.
    All { search: Option<String> },
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows.
    Following(Uuid),
}

impl Feed {
    fn push_filter(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Feed::All { search: None } => {}
            Feed::All { search: Some(keyword) } => {
                qb.push(" WHERE (");
                let mut variants = qb.separated(" OR ");
                for variant in search_variants(keyword) {
                    variants.push("instr(p.text, ");
                    variants.push_bind_unseparated(variant);
                    variants.push_unseparated(") > 0");
                }
                qb.push(")");
            }
            Feed::Group(group_id) => {
                qb.push(" WHERE p.group_id=").push_bind(*group_id);
            }
            Feed::Author(author_id) => {
                qb.push(" WHERE p.author_id=").push_bind(*author_id);
            }
            Feed::Following(user_id) => {
                qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id=")
                    .push_bind(*user_id)
                    .push(")");
            }
        }
    }
}

/// Lower, upper and capitalised spellings of the keyword. Search matches a
/// post when any one of them occurs in its text verbatim.
pub fn search_variants(keyword: &str) -> Vec<String> {
    let lower = keyword.to_lowercase();
    let upper = keyword.to_uppercase();
    let mut chars = lower.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    let mut variants: Vec<String> = Vec::with_capacity(3);
    for variant in [lower, upper, capitalized] {
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

pub async fn count(db_pool: &SqlitePool, feed: &Feed) -> sqlx::Result<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
    feed.push_filter(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(db_pool).await
}

/// One window of the feed, newest first.
pub async fn list(
    db_pool: &SqlitePool,
    feed: &Feed,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Post>> {
    let mut qb = QueryBuilder::new(select_posts!());
    feed.push_filter(&mut qb);
    qb.push(NEWEST_FIRST)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb.build_query_as::<Post>().fetch_all(db_pool).await
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<Option<Post>> {
    sqlx::query_as(concat!(select_posts!(), " WHERE p.id=?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn count_by_author<'e, E: SqliteExecutor<'e>>(db: E, author_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id=?")
        .bind(author_id)
        .fetch_one(db)
        .await
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

pub async fn create<'e, E: SqliteExecutor<'e>>(
    db: E,
    author_id: Uuid,
    post: &NewPost,
) -> sqlx::Result<Uuid> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO posts (id,text,created_at,author_id,group_id,image) VALUES (?,?,?,?,?,?)")
        .bind(id)
        .bind(&post.text)
        .bind(now())
        .bind(author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(db)
        .await?;
    Ok(id)
}

/// Rewrites text and group; the image only changes when a new one is given.
/// Only touches the row while it still belongs to `author_id`.
pub async fn update<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: Uuid,
    author_id: Uuid,
    post: &NewPost,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE posts SET text=?, group_id=?, image=COALESCE(?, image) WHERE id=? AND author_id=?",
    )
    .bind(&post.text)
    .bind(post.group_id)
    .bind(&post.image)
    .bind(id)
    .bind(author_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the post and, through the schema, its comments.
pub async fn delete<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid, author_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id=? AND author_id=?")
        .bind(id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
