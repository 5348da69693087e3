pub mod about;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod forms;
pub mod mail;
pub mod media;
pub mod paginate;
pub mod posts;
pub mod res;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

pub use cache::PageCache;
pub use config::Config;
pub use mail::Mailer;
pub use media::MediaStore;

/// Largest accepted request body; uploads are the only big ones.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
    pub cache: PageCache,
    pub mailer: Arc<dyn Mailer>,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let cache = PageCache::new(config.index_cache_ttl);
        let media = MediaStore::new(config.media_dir.clone());

        AppState {
            db_pool,
            config: Arc::new(config),
            cache,
            mailer,
            media,
        }
    }
}

/// Full router with sessions, tracing and media serving wired in.
pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            state.config.session_days,
        )));

    Router::new()
        .merge(posts::router())
        .nest("/auth", auth::router())
        .nest("/about", about::router())
        .nest_service("/media", ServeDir::new(state.media.root()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, res::not_found_page()).into_response(),
            AppError::Internal(err) => {
                tracing::error!("{err:#}\n\n{}", err.backtrace());
                (StatusCode::INTERNAL_SERVER_ERROR, res::server_error_page()).into_response()
            }
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::extract::multipart::MultipartError);
apperr_impl!(std::io::Error);
