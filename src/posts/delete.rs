use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{AppError, AppResult, AppState, db, session::LoggedIn};

use super::{detail_url, parse_id, profile_url};

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    Path(post_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;

    let mut tx = db::begin_write(&db_pool).await?;
    let Some(post) = db::posts::get(&mut *tx, post_id).await? else {
        return Err(AppError::NotFound);
    };
    if post.author_id != user.id {
        debug!(%post_id, user = %user.username, "delete refused: not the author");
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    if !db::posts::delete(&mut *tx, post.id, user.id).await? {
        debug!(%post_id, "post vanished before the delete");
        return Err(AppError::NotFound);
    }
    tx.commit().await?;
    info!(%post_id, by = %user.username, "post deleted");

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}
