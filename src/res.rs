use axum::response::Html;
use time::OffsetDateTime;

use crate::db;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// HTML-escapes user text. Braces are escaped too so nothing a user types
/// can collide with a template placeholder.
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text)
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

/// Escaped text with line breaks kept.
pub fn paragraph(text: &str) -> String {
    escape(text).replace("\r\n", "\n").replace('\n', "<br>")
}

pub fn date(timestamp: i64) -> String {
    match OffsetDateTime::from_unix_timestamp(timestamp) {
        Ok(at) => format!("{} {:02}:{:02}", at.date(), at.hour(), at.minute()),
        Err(_) => String::new(),
    }
}

/// Wraps page content in the site layout.
pub fn page(title: &str, viewer: Option<&db::User>, content: &str) -> Html<String> {
    let nav = match viewer {
        Some(user) => include_res!(str, "/pages/nav_user.html")
            .replace("{username}", &escape(&user.username)),
        None => include_res!(str, "/pages/nav_guest.html").to_owned(),
    };

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &escape(title))
            .replace("{nav}", &nav)
            .replace("{content}", content),
    )
}

pub fn not_found_page() -> Html<String> {
    page("Page not found", None, include_res!(str, "/pages/404.html"))
}

pub fn server_error_page() -> Html<String> {
    page("Server error", None, include_res!(str, "/pages/500.html"))
}

/// Renders trusted Markdown; raw HTML in the source is shown as text.
pub fn markdown(source: &str) -> String {
    use pulldown_cmark::{Event, Options, Parser};

    let parser = Parser::new_ext(source, Options::ENABLE_TABLES).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}
