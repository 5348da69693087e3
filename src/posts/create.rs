use axum::{
    debug_handler,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    AppResult, AppState, MediaStore,
    db::{self, posts::NewPost},
    forms::MultipartForm,
    res,
    session::LoggedIn,
};

use super::{
    forms::{PostForm, PostFormPage, render_post_form},
    profile_url,
};

const CREATE_PAGE: PostFormPage<'static> = PostFormPage {
    heading: "New post",
    action: "/create",
    button: "Publish",
};

#[debug_handler(state = AppState)]
pub(crate) async fn create_page(
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    let groups = db::groups::list(&db_pool).await?;
    let content = render_post_form(&CREATE_PAGE, "", None, &groups, None);
    Ok(res::page("New post", Some(&user), &content).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    LoggedIn(user): LoggedIn,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = PostForm::from_multipart(MultipartForm::read(multipart).await?);

    let clean = match form.check(&db_pool).await? {
        Ok(clean) => clean,
        Err(errors) => {
            let groups = db::groups::list(&db_pool).await?;
            let content = render_post_form(
                &CREATE_PAGE,
                form.text.as_deref().unwrap_or_default(),
                form.group.as_deref(),
                &groups,
                Some(&errors),
            );
            return Ok(res::page("New post", Some(&user), &content).into_response());
        }
    };

    let image = match &clean.image {
        Some(image) => Some(media.save("posts", image).await?),
        None => None,
    };
    let post = NewPost {
        text: clean.text,
        group_id: clean.group_id,
        image,
    };
    let post_id = match db::posts::create(&db_pool, user.id, &post).await {
        Ok(post_id) => post_id,
        Err(err) => {
            media.discard(post.image.as_deref()).await;
            return Err(err.into());
        }
    };
    info!(%post_id, by = %user.username, "post created");

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}
