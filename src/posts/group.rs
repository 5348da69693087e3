use std::sync::Arc;

use axum::{
    Form, debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    AppError, AppResult, AppState, Config,
    db::{self, posts::Feed},
    include_res,
    res::{self, escape},
    session::{LoggedIn, Viewer},
};

use super::{FeedQuery, forms::{GroupForm, render_group_form}, load_page, paginator, post_cards};

#[debug_handler(state = AppState)]
pub(crate) async fn group_posts(
    Path(slug): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    viewer: Viewer,
    Query(FeedQuery { page, .. }): Query<FeedQuery>,
) -> AppResult<Response> {
    let Some(group) = db::groups::by_slug(&db_pool, &slug).await? else {
        return Err(AppError::NotFound);
    };

    let page = load_page(&db_pool, &config, &Feed::Group(group.id), page.as_deref()).await?;

    let content = include_res!(str, "/pages/posts/group_list.html")
        .replace("{title}", &escape(&group.title))
        .replace("{description}", &res::paragraph(&group.description))
        .replace("{paginator}", &paginator(&page, &[]))
        .replace("{posts}", &post_cards(&page.items));

    Ok(res::page(&group.title, viewer.user(), &content).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_group_page(LoggedIn(user): LoggedIn) -> Response {
    let content = render_group_form(&GroupForm::default(), None);
    res::page("New group", Some(&user), &content).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_group(
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
    Form(form): Form<GroupForm>,
) -> AppResult<Response> {
    let form = form.cleaned();
    if let Err(errors) = form.check() {
        let content = render_group_form(&form, Some(&errors));
        return Ok(res::page("New group", Some(&user), &content).into_response());
    }

    // A taken slug is left to the unique constraint.
    let group = db::groups::create(
        &db_pool,
        form.title.as_deref().unwrap_or_default(),
        form.slug.as_deref(),
        form.description.as_deref().unwrap_or_default(),
    )
    .await?;

    info!(slug = %group.slug, by = %user.username, "group created");
    Ok(Redirect::to(&format!("/group/{}", group.slug)).into_response())
}
