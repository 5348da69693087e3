use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    AppError, AppResult, AppState, MediaStore,
    db::{self, posts::NewPost},
    forms::MultipartForm,
    res,
    session::LoggedIn,
};

use super::{
    detail_url,
    forms::{PostForm, PostFormPage, render_post_form},
    parse_id,
};

fn edit_page_for(action: &str) -> PostFormPage<'_> {
    PostFormPage {
        heading: "Edit post",
        action,
        button: "Save",
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    Path(post_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let Some(post) = db::posts::get(&db_pool, post_id).await? else {
        return Err(AppError::NotFound);
    };
    if post.author_id != user.id {
        debug!(%post_id, user = %user.username, "edit refused: not the author");
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let groups = db::groups::list(&db_pool).await?;
    let action = format!("{}/edit", detail_url(post.id));
    let group = post.group_id.map(|id| id.to_string());
    let content = render_post_form(&edit_page_for(&action), &post.text, group.as_deref(), &groups, None);
    Ok(res::page("Edit post", Some(&user), &content).into_response())
}

/// Ownership check, validation and update run in one transaction.
#[debug_handler(state = AppState)]
pub(crate) async fn edit(
    Path(post_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    LoggedIn(user): LoggedIn,
    multipart: Multipart,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let form = PostForm::from_multipart(MultipartForm::read(multipart).await?);

    let mut tx = db::begin_write(&db_pool).await?;
    let Some(post) = db::posts::get(&mut *tx, post_id).await? else {
        return Err(AppError::NotFound);
    };
    if post.author_id != user.id {
        debug!(%post_id, user = %user.username, "edit refused: not the author");
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let clean = match form.check(&mut *tx).await? {
        Ok(clean) => clean,
        Err(errors) => {
            drop(tx);
            let groups = db::groups::list(&db_pool).await?;
            let action = format!("{}/edit", detail_url(post.id));
            let content = render_post_form(
                &edit_page_for(&action),
                form.text.as_deref().unwrap_or_default(),
                form.group.as_deref(),
                &groups,
                Some(&errors),
            );
            return Ok(res::page("Edit post", Some(&user), &content).into_response());
        }
    };

    let image = match &clean.image {
        Some(image) => Some(media.save("posts", image).await?),
        None => None,
    };
    let changes = NewPost {
        text: clean.text,
        group_id: clean.group_id,
        image,
    };
    let written = async {
        let updated = db::posts::update(&mut *tx, post.id, user.id, &changes).await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>(updated)
    }
    .await;
    match written {
        Ok(true) => {}
        Ok(false) => {
            debug!(%post_id, "post vanished before the update");
            media.discard(changes.image.as_deref()).await;
            return Err(AppError::NotFound);
        }
        Err(err) => {
            media.discard(changes.image.as_deref()).await;
            return Err(err.into());
        }
    }
    info!(%post_id, by = %user.username, "post edited");

    Ok(Redirect::to(&detail_url(post.id)).into_response())
}
