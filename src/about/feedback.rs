use std::sync::Arc;

use axum::{
    Form, debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::{
    AppResult, AppState, Config, Mailer,
    forms::{clean, error_list},
    include_res,
    mail::Mail,
    res::{self, escape},
    session::Viewer,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct FeedbackForm {
    #[validate(
        required(message = "This field is required."),
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    name: Option<String>,
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    email: Option<String>,
    #[validate(required(message = "This field is required."))]
    text: Option<String>,
}

impl FeedbackForm {
    fn cleaned(self) -> Self {
        Self {
            name: clean(self.name),
            email: clean(self.email),
            text: clean(self.text),
        }
    }
}

/// Mails a visitor's message to the site owner. Delivery failures are
/// returned to the caller.
pub async fn send_feedback(
    mailer: &dyn Mailer,
    recipient: &str,
    name: &str,
    email: &str,
    text: &str,
) -> anyhow::Result<()> {
    mailer
        .send(Mail {
            subject: format!("Feedback from {name}"),
            body: text.to_owned(),
            from: email.to_owned(),
            to: vec![recipient.to_owned()],
        })
        .await?;
    info!(from = %email, "feedback delivered");
    Ok(())
}

fn render(viewer: &Viewer, form: &FeedbackForm, errors: Option<&ValidationErrors>) -> Response {
    let field = |value: &Option<String>| escape(value.as_deref().unwrap_or_default());
    let content = include_res!(str, "/pages/about/feedback.html")
        .replace("{name_errors}", &error_list(errors, "name"))
        .replace("{email_errors}", &error_list(errors, "email"))
        .replace("{text_errors}", &error_list(errors, "text"))
        .replace("{name}", &field(&form.name))
        .replace("{email}", &field(&form.email))
        .replace("{text}", &field(&form.text));
    res::page("Feedback", viewer.user(), &content).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn feedback_page(viewer: Viewer) -> Response {
    render(&viewer, &FeedbackForm::default(), None)
}

#[debug_handler(state = AppState)]
pub(crate) async fn feedback(
    viewer: Viewer,
    State(config): State<Arc<Config>>,
    State(mailer): State<Arc<dyn Mailer>>,
    Form(form): Form<FeedbackForm>,
) -> AppResult<Response> {
    let form = form.cleaned();
    if let Err(errors) = form.validate() {
        return Ok(render(&viewer, &form, Some(&errors)));
    }

    send_feedback(
        mailer.as_ref(),
        &config.feedback_recipient,
        form.name.as_deref().unwrap_or_default(),
        form.email.as_deref().unwrap_or_default(),
        form.text.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Redirect::to("/about/thanks").into_response())
}
