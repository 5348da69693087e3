use axum::{
    Form, debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{debug, info};
use validator::{Validate, ValidationErrors};

use crate::{
    AppResult, AppState, db,
    forms::{clean, error_list},
    include_res,
    res::{self, escape},
    session::{log_in, login_url, safe_next},
};

use super::verify_password;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct LoginForm {
    #[validate(required(message = "This field is required."))]
    username: Option<String>,
    #[validate(required(message = "This field is required."))]
    password: Option<String>,
}

fn render(
    next: &str,
    username: &str,
    errors: Option<&ValidationErrors>,
    form_error: Option<&str>,
) -> Response {
    let form_errors = match form_error {
        Some(message) => format!("<ul class=\"errors\"><li>{}</li></ul>", escape(message)),
        None => String::new(),
    };
    let content = include_res!(str, "/pages/auth/login.html")
        .replace("{form_errors}", &form_errors)
        .replace("{username_errors}", &error_list(errors, "username"))
        .replace("{password_errors}", &error_list(errors, "password"))
        .replace("{action}", &escape(&login_url(next)))
        .replace("{username}", &escape(username));
    res::page("Log in", None, &content).into_response()
}

#[debug_handler]
pub(crate) async fn login_page(Query(LoginQuery { next }): Query<LoginQuery>) -> Response {
    render(safe_next(next.as_deref()), "", None, None)
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    Query(LoginQuery { next }): Query<LoginQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(next.as_deref());
    let form = LoginForm {
        username: clean(form.username),
        password: form.password.filter(|p| !p.is_empty()),
    };
    let username = form.username.as_deref().unwrap_or_default();

    if let Err(errors) = form.validate() {
        return Ok(render(next, username, Some(&errors), None));
    }

    let password = form.password.as_deref().unwrap_or_default();
    let user = match db::users::by_username(&db_pool, username).await? {
        Some(user) if verify_password(&user.password_hash, password)? => user,
        _ => {
            debug!(username, "failed login");
            return Ok(render(next, username, None, Some(BAD_CREDENTIALS)));
        }
    };

    log_in(&session, &user).await?;
    info!(username = %user.username, "welcome back");

    Ok(Redirect::to(next).into_response())
}
