use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::ValidationErrors;

use crate::{
    AppError, AppResult, AppState, MediaStore,
    db::{self, User},
    forms::{MultipartForm, error_list},
    include_res,
    res::{self, escape},
    session::LoggedIn,
};

use super::{forms::ProfileForm, image_tag, profile_url};

/// Resolves the profile owner; anyone but the owner is sent to the profile.
async fn owner(db_pool: &SqlitePool, username: &str, user: &User) -> AppResult<Result<(), Response>> {
    let Some(author) = db::users::by_username(db_pool, username).await? else {
        return Err(AppError::NotFound);
    };
    if author.id != user.id {
        debug!(author = %author.username, user = %user.username, "avatar change refused");
        return Ok(Err(Redirect::to(&profile_url(&author.username)).into_response()));
    }
    Ok(Ok(()))
}

async fn render_avatar_form(
    db_pool: &SqlitePool,
    user: &User,
    errors: Option<&ValidationErrors>,
) -> AppResult<Response> {
    let count = db::posts::count_by_author(db_pool, user.id).await?;
    let avatar = db::profiles::for_user(db_pool, user.id)
        .await?
        .and_then(|profile| profile.avatar);

    let content = include_res!(str, "/pages/posts/avatar.html")
        .replace("{username}", &escape(&user.username))
        .replace("{count}", &count.to_string())
        .replace("{avatar_errors}", &error_list(errors, "avatar"))
        .replace("{avatar}", &image_tag(avatar.as_deref(), "avatar"));

    Ok(res::page("Avatar", Some(user), &content).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn avatar_page(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    LoggedIn(user): LoggedIn,
) -> AppResult<Response> {
    if let Err(redirect) = owner(&db_pool, &username, &user).await? {
        return Ok(redirect);
    }
    render_avatar_form(&db_pool, &user, None).await
}

/// Creates the profile on first upload and updates it afterwards; the
/// upsert keeps a user at exactly one profile.
#[debug_handler(state = AppState)]
pub(crate) async fn avatar(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    LoggedIn(user): LoggedIn,
    multipart: Multipart,
) -> AppResult<Response> {
    if let Err(redirect) = owner(&db_pool, &username, &user).await? {
        return Ok(redirect);
    }

    let form = ProfileForm::from_multipart(MultipartForm::read(multipart).await?);
    let image = match form.check() {
        Ok(image) => image,
        Err(errors) => return render_avatar_form(&db_pool, &user, Some(&errors)).await,
    };

    let avatar = match &image {
        Some(image) => Some(media.save("avatars", image).await?),
        None => None,
    };
    let profile = match db::profiles::upsert_avatar(&db_pool, user.id, avatar.as_deref()).await {
        Ok(profile) => profile,
        Err(err) => {
            media.discard(avatar.as_deref()).await;
            return Err(err.into());
        }
    };
    info!(profile_id = %profile.id, user = %user.username, "avatar saved");

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}
