use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use url::form_urlencoded;
use uuid::Uuid;

use crate::{AppError, db};

pub const USER_ID: &str = "user_id";

/// The user behind the request, if anyone is logged in.
pub struct Viewer(pub Option<db::User>);

/// The logged-in user; anyone else is sent to the login page.
pub struct LoggedIn(pub db::User);

impl Viewer {
    pub fn user(&self) -> Option<&db::User> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::from(msg))?;

        let Some(user_id) = session.get::<Uuid>(USER_ID).await? else {
            return Ok(Viewer(None));
        };

        let db_pool = SqlitePool::from_ref(state);
        let user = db::users::get(&db_pool, user_id).await?;
        if user.is_none() {
            session.remove::<Uuid>(USER_ID).await?;
        }
        Ok(Viewer(user))
    }
}

impl<S> FromRequestParts<S> for LoggedIn
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Viewer::from_request_parts(parts, state).await {
            Ok(Viewer(Some(user))) => Ok(LoggedIn(user)),
            Ok(Viewer(None)) => {
                tracing::debug!(path = parts.uri.path(), "login required");
                Err(Redirect::to(&login_url(parts.uri.path())).into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

/// Login page that returns to `next` afterwards. The path is
/// percent-encoded so a `+` or `&` in it survives the round trip.
pub fn login_url(next: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login?next={next}")
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/",
    }
}

pub async fn log_in(session: &Session, user: &db::User) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await
}
