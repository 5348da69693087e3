use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{
    AppError, AppResult, AppState, Config,
    db::{self, posts::Feed},
    include_res,
    res::{self, escape},
    session::Viewer,
};

use super::{FeedQuery, image_tag, load_page, paginator, post_cards};

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    viewer: Viewer,
    Query(FeedQuery { page, .. }): Query<FeedQuery>,
) -> AppResult<Response> {
    let Some(author) = db::users::by_username(&db_pool, &username).await? else {
        return Err(AppError::NotFound);
    };

    let feed = Feed::Author(author.id);
    let count = db::posts::count(&db_pool, &feed).await?;
    let page = load_page(&db_pool, &config, &feed, page.as_deref()).await?;
    let avatar = db::profiles::for_user(&db_pool, author.id)
        .await?
        .and_then(|profile| profile.avatar);

    let name = escape(&author.username);
    let actions = match viewer.id() {
        Some(viewer_id) if viewer_id == author.id => {
            format!("<p><a href=\"/profile/{name}/avatar\">Change avatar</a></p>")
        }
        Some(viewer_id) => {
            if db::follows::is_following(&db_pool, viewer_id, author.id).await? {
                format!("<p><a href=\"/profile/{name}/unfollow\">Unfollow</a></p>")
            } else {
                format!("<p><a href=\"/profile/{name}/follow\">Follow</a></p>")
            }
        }
        None => String::new(),
    };

    let content = include_res!(str, "/pages/posts/profile.html")
        .replace("{username}", &name)
        .replace("{avatar}", &image_tag(avatar.as_deref(), "avatar"))
        .replace("{count}", &count.to_string())
        .replace("{actions}", &actions)
        .replace("{paginator}", &paginator(&page, &[]))
        .replace("{posts}", &post_cards(&page.items));

    Ok(res::page(&author.username, viewer.user(), &content).into_response())
}
