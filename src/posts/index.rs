use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State},
    http::Uri,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState, Config, PageCache,
    db::posts::Feed,
    forms::clean,
    include_res,
    res::{self, escape},
    session::Viewer,
};

use super::{FeedQuery, load_page, paginator, post_cards};

/// Home feed. The rendered page is cached per viewer and URI, so new posts
/// only show up once the entry expires or the cache is cleared.
#[debug_handler(state = AppState)]
pub(crate) async fn index(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    State(cache): State<PageCache>,
    viewer: Viewer,
    uri: Uri,
    Query(FeedQuery { page, search }): Query<FeedQuery>,
) -> AppResult<Response> {
    let key = match viewer.id() {
        Some(user_id) => format!("{user_id}|{uri}"),
        None => format!("-|{uri}"),
    };
    if let Some(html) = cache.get(&key).await {
        return Ok(Html(html).into_response());
    }

    let search = clean(search);
    let feed = Feed::All { search: search.clone() };
    let page = load_page(&db_pool, &config, &feed, page.as_deref()).await?;

    let params: Vec<(&str, &str)> = search.iter().map(|search| ("search", search.as_str())).collect();
    let content = include_res!(str, "/pages/posts/index.html")
        .replace("{search}", &escape(search.as_deref().unwrap_or_default()))
        .replace("{paginator}", &paginator(&page, &params))
        .replace("{posts}", &post_cards(&page.items));

    let Html(html) = res::page("Latest posts", viewer.user(), &content);
    cache.insert(key, html.clone()).await;
    Ok(Html(html).into_response())
}
