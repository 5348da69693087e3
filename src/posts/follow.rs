use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    AppError, AppResult, AppState, Config,
    db::{self, posts::Feed},
    include_res, res,
    session::LoggedIn,
};

use super::{FeedQuery, load_page, paginator, post_cards, profile_url};

/// Posts by the authors the user follows.
#[debug_handler(state = AppState)]
pub(crate) async fn follow_index(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    LoggedIn(user): LoggedIn,
    Query(FeedQuery { page, .. }): Query<FeedQuery>,
) -> AppResult<Response> {
    let page = load_page(&db_pool, &config, &Feed::Following(user.id), page.as_deref()).await?;

    let content = include_res!(str, "/pages/posts/follow.html")
        .replace("{paginator}", &paginator(&page, &[]))
        .replace("{posts}", &post_cards(&page.items));

    Ok(res::page("Following", Some(&user), &content).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn follow(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    let Some(author) = db::users::by_username(&db_pool, &username).await? else {
        return Err(AppError::NotFound);
    };

    if author.id == user.id {
        debug!(user = %user.username, "refused self-follow");
        return Ok(Redirect::to(&profile_url(&user.username)).into_response());
    }

    if db::follows::follow(&db_pool, user.id, author.id).await? {
        info!(user = %user.username, author = %author.username, "followed");
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

/// Lands on the author's profile whether or not a pair existed.
#[debug_handler(state = AppState)]
pub(crate) async fn unfollow(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    let Some(author) = db::users::by_username(&db_pool, &username).await? else {
        return Err(AppError::NotFound);
    };

    if db::follows::unfollow(&db_pool, user.id, author.id).await? {
        info!(user = %user.username, author = %author.username, "unfollowed");
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}
