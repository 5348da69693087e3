mod login;
mod logout;
mod signup;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Router, routing::get};
use sqlx::SqlitePool;
use tracing::info;

use crate::{AppState, db};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup::signup_page).post(signup::signup))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout).post(logout::logout))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password_hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("failed to verify password: {e}")),
    }
}

/// Stores a new account with a freshly hashed password.
pub async fn create_user(
    db_pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<db::User> {
    let password_hash = hash_password(password)?;
    let user = db::users::create(db_pool, username, email, &password_hash).await?;
    info!(username, "user signed up");
    Ok(user)
}
