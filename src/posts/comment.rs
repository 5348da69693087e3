use axum::{
    Form, debug_handler,
    extract::{Path, State},
    http::Method,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::{
    AppError, AppResult, AppState, db,
    session::{LoggedIn, Viewer},
};

use super::{detail::render_detail, detail_url, forms::CommentForm, parse_id};

/// Anyone logged in may comment. An empty comment re-renders the post with
/// the error instead of storing anything; a plain GET just lands on the post.
#[debug_handler(state = AppState)]
pub(crate) async fn add_comment(
    method: Method,
    Path(post_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let Some(post) = db::posts::get(&db_pool, post_id).await? else {
        return Err(AppError::NotFound);
    };

    if method != Method::POST {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let form = form.cleaned();
    if let Err(errors) = form.validate() {
        let viewer = Viewer(Some(user));
        return render_detail(&db_pool, &viewer, &post, "", Some(&errors)).await;
    }

    let text = form.text.unwrap_or_default();
    let comment_id = db::comments::create(&db_pool, post.id, user.id, &text).await?;
    info!(%comment_id, post_id = %post.id, by = %user.username, "comment added");

    Ok(Redirect::to(&detail_url(post.id)).into_response())
}
