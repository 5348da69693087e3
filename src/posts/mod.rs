mod avatar;
mod comment;
mod create;
mod delete;
mod detail;
mod edit;
mod follow;
mod forms;
mod group;
mod index;
mod profile;

use axum::{Router, routing::get};
use serde::Deserialize;
use sqlx::SqlitePool;
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    AppError, AppResult, AppState, Config,
    db::{self, Post, posts::Feed},
    include_res,
    paginate::{Page, Paginator},
    res::{self, escape},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/follow", get(follow::follow_index))
        .route("/create", get(create::create_page).post(create::create))
        .route("/group/new", get(group::new_group_page).post(group::new_group))
        .route("/group/{slug}", get(group::group_posts))
        .route("/profile/{username}", get(profile::profile))
        .route("/profile/{username}/follow", get(follow::follow).post(follow::follow))
        .route("/profile/{username}/unfollow", get(follow::unfollow).post(follow::unfollow))
        .route("/profile/{username}/avatar", get(avatar::avatar_page).post(avatar::avatar))
        .route("/posts/{id}", get(detail::post_detail))
        .route("/posts/{id}/edit", get(edit::edit_page).post(edit::edit))
        .route("/posts/{id}/delete", get(delete::delete).post(delete::delete))
        .route("/posts/{id}/comment", get(comment::add_comment).post(comment::add_comment))
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedQuery {
    pub(crate) page: Option<String>,
    pub(crate) search: Option<String>,
}

/// Unparsable ids cannot name a post.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{username}")
}

pub(crate) fn detail_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}")
}

pub(crate) async fn load_page(
    db_pool: &SqlitePool,
    config: &Config,
    feed: &Feed,
    page: Option<&str>,
) -> AppResult<Page<Post>> {
    let total = db::posts::count(db_pool, feed).await?;
    let window = Paginator::new(config.posts_per_page).window(page, total);
    let posts = db::posts::list(db_pool, feed, window.limit(), window.offset()).await?;
    Ok(window.fill(posts))
}

pub(crate) fn post_cards(posts: &[Post]) -> String {
    if posts.is_empty() {
        return "<p>No posts yet.</p>".to_owned();
    }
    posts.iter().map(post_card).collect()
}

pub(crate) fn post_card(post: &Post) -> String {
    include_res!(str, "/pages/posts/post_card.html")
        .replace("{id}", &post.id.to_string())
        .replace("{author}", &escape(&post.author))
        .replace("{date}", &res::date(post.created_at))
        .replace("{group}", &group_link(post))
        .replace("{image}", &image_tag(post.image.as_deref(), "post-image"))
        .replace("{text}", &res::paragraph(&post.text))
}

pub(crate) fn group_link(post: &Post) -> String {
    match (&post.group_slug, &post.group_title) {
        (Some(slug), Some(title)) => format!(
            " · <a href=\"/group/{}\">{}</a>",
            escape(slug),
            escape(title)
        ),
        _ => String::new(),
    }
}

pub(crate) fn image_tag(path: Option<&str>, class: &str) -> String {
    match path {
        Some(path) => format!("<img class=\"{class}\" src=\"/media/{}\" alt=\"\">", escape(path)),
        None => String::new(),
    }
}

/// Previous/next links that keep the listing's other query parameters.
pub(crate) fn paginator<T>(page: &Page<T>, params: &[(&str, &str)]) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let link = |number: i64, label: &str| {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query.append_pair("page", &number.to_string());
        format!("<a href=\"?{}\">{label}</a>", escape(&query.finish()))
    };

    let previous = if page.has_previous() {
        link(page.number - 1, "&laquo; Previous")
    } else {
        String::new()
    };
    let next = if page.has_next() {
        link(page.number + 1, "Next &raquo;")
    } else {
        String::new()
    };

    include_res!(str, "/pages/paginator.html")
        .replace("{number}", &page.number.to_string())
        .replace("{num_pages}", &page.num_pages.to_string())
        .replace("{previous}", &previous)
        .replace("{next}", &next)
}
