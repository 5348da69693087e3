use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use validator::ValidationErrors;

use crate::{
    AppError, AppResult, AppState,
    db::{self, Post},
    forms::error_list,
    include_res,
    res::{self, escape},
    session::{Viewer, login_url},
};

use super::{detail_url, group_link, image_tag, parse_id};

#[debug_handler(state = AppState)]
pub(crate) async fn post_detail(
    Path(post_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    viewer: Viewer,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let Some(post) = db::posts::get(&db_pool, post_id).await? else {
        return Err(AppError::NotFound);
    };

    render_detail(&db_pool, &viewer, &post, "", None).await
}

/// The post with its author's post count, its comments (newest first) and
/// the comment form, pre-filled and annotated when a submission failed.
pub(crate) async fn render_detail(
    db_pool: &SqlitePool,
    viewer: &Viewer,
    post: &Post,
    comment_text: &str,
    errors: Option<&ValidationErrors>,
) -> AppResult<Response> {
    let count = db::posts::count_by_author(db_pool, post.author_id).await?;
    let comments: String = db::comments::for_post(db_pool, post.id)
        .await?
        .iter()
        .map(|comment| {
            include_res!(str, "/pages/posts/comment.html")
                .replace("{author}", &escape(&comment.author))
                .replace("{date}", &res::date(comment.created_at))
                .replace("{text}", &res::paragraph(&comment.text))
        })
        .collect();

    let id = post.id.to_string();
    let comment_form = if viewer.user().is_some() {
        include_res!(str, "/pages/posts/comment_form.html")
            .replace("{id}", &id)
            .replace("{text_errors}", &error_list(errors, "text"))
            .replace("{text}", &escape(comment_text))
    } else {
        format!(
            "<p><a href=\"{}\">Log in</a> to comment.</p>",
            escape(&login_url(&detail_url(post.id)))
        )
    };

    let actions = if viewer.id() == Some(post.author_id) {
        format!("<p><a href=\"/posts/{id}/edit\">Edit</a> <a href=\"/posts/{id}/delete\">Delete</a></p>")
    } else {
        String::new()
    };

    let content = include_res!(str, "/pages/posts/post_detail.html")
        .replace("{id}", &id)
        .replace("{author}", &escape(&post.author))
        .replace("{count}", &count.to_string())
        .replace("{date}", &res::date(post.created_at))
        .replace("{group}", &group_link(post))
        .replace("{image}", &image_tag(post.image.as_deref(), "post-image"))
        .replace("{actions}", &actions)
        .replace("{comment_form}", &comment_form)
        .replace("{comments}", &comments)
        .replace("{text}", &res::paragraph(&post.text));

    let title: String = post.text.chars().take(30).collect();
    Ok(res::page(&title, viewer.user(), &content).into_response())
}
