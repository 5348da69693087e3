#![allow(dead_code)]

use std::{io::Cursor, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use tempfile::TempDir;
use tower::ServiceExt;
use url::form_urlencoded;
use uuid::Uuid;
use yatube::{
    AppState, Config, Mailer, app, auth, db,
    mail::{Mail, Outbox},
};

pub const PASSWORD: &str = "Password_12345";
const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub outbox: Arc<Outbox>,
    _dir: TempDir,
}

/// Refuses every mail.
pub struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _mail: Mail) -> anyhow::Result<()> {
        anyhow::bail!("SMTP relay unreachable")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let outbox = Arc::new(Outbox::default());
        Self::build(outbox.clone(), outbox, false).await
    }

    pub async fn with_broken_mailer() -> Self {
        Self::build(Arc::new(BrokenMailer), Arc::new(Outbox::default()), false).await
    }

    /// Backed by a database file with a full connection pool.
    pub async fn on_disk() -> Self {
        let outbox = Arc::new(Outbox::default());
        Self::build(outbox.clone(), outbox, true).await
    }

    async fn build(mailer: Arc<dyn Mailer>, outbox: Arc<Outbox>, on_disk: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            media_dir: dir.path().join("media"),
            index_cache_ttl: Duration::from_secs(60),
            posts_per_page: 10,
            feedback_recipient: "admin@yatube.local".to_owned(),
            ..Config::default()
        };

        let db_pool = if on_disk {
            let url = format!("sqlite://{}", dir.path().join("yatube.db").display());
            db::connect(&url).await.unwrap()
        } else {
            db::connect_in_memory().await.unwrap()
        };
        let state = AppState::new(db_pool, config, mailer);

        Self {
            app: app(state.clone()),
            state,
            outbox,
            _dir: dir,
        }
    }

    pub async fn user(&self, username: &str) -> db::User {
        auth::create_user(&self.state.db_pool, username, &format!("{username}@example.com"), PASSWORD)
            .await
            .unwrap()
    }

    /// Logs in through the form and returns the session cookie.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .post_form("/auth/login", None, &[("username", username), ("password", PASSWORD)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login sets a session cookie")
    }

    pub async fn post(&self, author: &db::User, text: &str, group_id: Option<Uuid>) -> Uuid {
        let post = db::posts::NewPost {
            text: text.to_owned(),
            group_id,
            image: None,
        };
        db::posts::create(&self.state.db_pool, author.id, &post).await.unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> db::Group {
        db::groups::create(&self.state.db_pool, title, Some(slug), "A test group")
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Response<Body> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> Response<Body> {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(multipart_body(fields, files))).unwrap())
            .await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A tiny valid PNG.
pub fn png() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
        .to_owned()
}

pub async fn text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Files stored under one media kind, e.g. `posts`.
pub fn media_files(app: &TestApp, kind: &str) -> usize {
    match std::fs::read_dir(app.state.media.root().join(kind)) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// The login redirect for a guest who asked for `path`.
pub fn login_redirect(path: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/auth/login?next={next}")
}

pub fn post_count(html: &str) -> usize {
    html.matches("<article id=\"post-").count()
}
