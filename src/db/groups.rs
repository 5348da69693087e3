use sqlx::SqliteExecutor;
use uuid::Uuid;

use super::Group;

pub const SLUG_MAX_LEN: usize = 100;

/// Slug used when a title has nothing transliterable in it.
const FALLBACK_SLUG: &str = "group";

/// Transliterates the title into a URL-safe token no longer than
/// [`SLUG_MAX_LEN`].
pub fn derive_slug(title: &str) -> String {
    let mut slug = slug::slugify(title);
    slug.truncate(SLUG_MAX_LEN);
    if slug.is_empty() {
        slug.push_str(FALLBACK_SLUG);
    }
    slug
}

/// Inserts a group. A missing slug is derived from the title; a duplicate
/// slug is a constraint violation and surfaces as an error.
pub async fn create<'e, E: SqliteExecutor<'e>>(
    db: E,
    title: &str,
    slug: Option<&str>,
    description: &str,
) -> sqlx::Result<Group> {
    let slug = match slug {
        Some(slug) if !slug.is_empty() => slug.to_owned(),
        _ => derive_slug(title),
    };

    sqlx::query_as(
        "INSERT INTO post_groups (id,title,slug,description) VALUES (?,?,?,?)
         RETURNING id,title,slug,description",
    )
    .bind(Uuid::now_v7())
    .bind(title)
    .bind(slug)
    .bind(description)
    .fetch_one(db)
    .await
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<Option<Group>> {
    sqlx::query_as("SELECT id,title,slug,description FROM post_groups WHERE id=?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn by_slug<'e, E: SqliteExecutor<'e>>(db: E, slug: &str) -> sqlx::Result<Option<Group>> {
    sqlx::query_as("SELECT id,title,slug,description FROM post_groups WHERE slug=?")
        .bind(slug)
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E: SqliteExecutor<'e>>(db: E) -> sqlx::Result<Vec<Group>> {
    sqlx::query_as("SELECT id,title,slug,description FROM post_groups ORDER BY title")
        .fetch_all(db)
        .await
}

/// Removes the group; its posts stay, with the group cleared.
pub async fn delete<'e, E: SqliteExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM post_groups WHERE id=?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
