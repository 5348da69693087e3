mod feedback;

use axum::{
    Router, debug_handler,
    response::Html,
    routing::get,
};

use crate::{AppState, include_res, res, session::Viewer};

pub use feedback::send_feedback;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/author", get(author))
        .route("/tech", get(tech))
        .route("/feedback", get(feedback::feedback_page).post(feedback::feedback))
        .route("/thanks", get(thanks))
}

#[debug_handler(state = AppState)]
async fn author(viewer: Viewer) -> Html<String> {
    let content = res::markdown(include_res!(str, "/pages/about/author.md"));
    res::page("About the author", viewer.user(), &content)
}

#[debug_handler(state = AppState)]
async fn tech(viewer: Viewer) -> Html<String> {
    let content = res::markdown(include_res!(str, "/pages/about/tech.md"));
    res::page("Technologies", viewer.user(), &content)
}

#[debug_handler(state = AppState)]
async fn thanks(viewer: Viewer) -> Html<String> {
    res::page("Thank you", viewer.user(), include_res!(str, "/pages/about/thanks.html"))
}
