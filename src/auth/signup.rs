use axum::{
    Form, debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use validator::{Validate, ValidationErrors};

use crate::{
    AppResult, AppState, db,
    forms::{add_error, clean, error_list},
    include_res,
    res::{self, escape},
    session::log_in,
};

use super::create_user;

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct SignupForm {
    #[validate(
        required(message = "This field is required."),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    username: Option<String>,
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    email: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(min = 8, message = "This password is too short. It must contain at least 8 characters.")
    )]
    password1: Option<String>,
    #[validate(required(message = "This field is required."))]
    password2: Option<String>,
}

/// Usernames appear in URLs, so they stay within a small ASCII alphabet.
fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl SignupForm {
    fn cleaned(self) -> Self {
        Self {
            username: clean(self.username),
            email: clean(self.email),
            password1: self.password1.filter(|p| !p.is_empty()),
            password2: self.password2.filter(|p| !p.is_empty()),
        }
    }

    async fn check(&self, db_pool: &SqlitePool) -> AppResult<Result<(), ValidationErrors>> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if let Some(username) = &self.username {
            if !valid_username(username) {
                add_error(
                    &mut errors,
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            } else if db::users::username_taken(db_pool, username).await? {
                add_error(&mut errors, "username", "A user with that username already exists.");
            }
        }

        if let (Some(password1), Some(password2)) = (&self.password1, &self.password2) {
            if password1 != password2 {
                add_error(&mut errors, "password2", "The two password fields didn't match.");
            }
        }

        Ok(if errors.is_empty() { Ok(()) } else { Err(errors) })
    }
}

fn render(form: &SignupForm, errors: Option<&ValidationErrors>) -> Response {
    let content = include_res!(str, "/pages/auth/signup.html")
        .replace("{username_errors}", &error_list(errors, "username"))
        .replace("{email_errors}", &error_list(errors, "email"))
        .replace("{password1_errors}", &error_list(errors, "password1"))
        .replace("{password2_errors}", &error_list(errors, "password2"))
        .replace("{username}", &escape(form.username.as_deref().unwrap_or_default()))
        .replace("{email}", &escape(form.email.as_deref().unwrap_or_default()));
    res::page("Sign up", None, &content).into_response()
}

#[debug_handler]
pub(crate) async fn signup_page() -> Response {
    render(&SignupForm::default(), None)
}

#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let form = form.cleaned();
    if let Err(errors) = form.check(&db_pool).await? {
        return Ok(render(&form, Some(&errors)));
    }

    let user = create_user(
        &db_pool,
        form.username.as_deref().unwrap_or_default(),
        form.email.as_deref().unwrap_or_default(),
        form.password1.as_deref().unwrap_or_default(),
    )
    .await?;
    log_in(&session, &user).await?;

    Ok(Redirect::to("/").into_response())
}
