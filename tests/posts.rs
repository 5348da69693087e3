mod common;

use axum::http::StatusCode;
use common::{TestApp, location, login_redirect, media_files, png, post_count, text};
use yatube::db::{self, posts::Feed};

#[tokio::test]
async fn guests_are_sent_to_login() {
    let app = TestApp::new().await;
    let author = app.user("leo").await;
    let post_id = app.post(&author, "Guarded", None).await;

    for uri in [
        "/create".to_owned(),
        "/follow".to_owned(),
        "/group/new".to_owned(),
        format!("/posts/{post_id}/edit"),
        format!("/posts/{post_id}/delete"),
        format!("/posts/{post_id}/comment"),
        "/profile/leo/follow".to_owned(),
        "/profile/leo/unfollow".to_owned(),
        "/profile/leo/avatar".to_owned(),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), login_redirect(&uri));
    }
    assert_eq!(login_redirect("/create"), "/auth/login?next=%2Fcreate");
}

#[tokio::test]
async fn create_post_with_group_and_image() {
    let app = TestApp::new().await;
    app.user("leo").await;
    let group = app.group("Cats", "cats").await;
    let cookie = app.login("leo").await;

    let group_id = group.id.to_string();
    let image = png();
    let response = app
        .post_multipart(
            "/create",
            Some(&cookie),
            &[("text", "A cat picture"), ("group", group_id.as_str())],
            &[("image", "cat.png", image.as_slice())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/leo");

    let profile = text(app.get("/profile/leo", None).await).await;
    assert!(profile.contains("A cat picture"));
    assert!(profile.contains("<img class=\"post-image\" src=\"/media/posts/"));

    let group_page = text(app.get("/group/cats", None).await).await;
    assert!(group_page.contains("A cat picture"));

    let posts = db::posts::list(&app.state.db_pool, &Feed::Group(group.id), 10, 0)
        .await
        .unwrap();
    let image = posts[0].image.clone().unwrap();
    let served = app.get(&format!("/media/{image}"), None).await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_post_form_rerenders_with_errors() {
    let app = TestApp::new().await;
    app.user("leo").await;
    let cookie = app.login("leo").await;

    let response = app.post_multipart("/create", Some(&cookie), &[("text", "   ")], &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("This field is required."));

    let response = app
        .post_multipart(
            "/create",
            Some(&cookie),
            &[("text", "Lost group"), ("group", "00000000-0000-0000-0000-000000000000")],
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Select a valid choice."));

    let response = app
        .post_multipart(
            "/create",
            Some(&cookie),
            &[("text", "Broken image")],
            &[("image", "fake.png", b"definitely not a png".as_slice())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Upload a valid image."));

    let count = db::posts::count(&app.state.db_pool, &Feed::All { search: None }).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn only_the_author_edits_and_deletes() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    app.user("mia").await;
    let post_id = app.post(&leo, "Original text", None).await;
    let detail = format!("/posts/{post_id}");

    let mia = app.login("mia").await;
    let response = app
        .post_multipart(&format!("{detail}/edit"), Some(&mia), &[("text", "Hijacked")], &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let response = app.post_form(&format!("{detail}/delete"), Some(&mia), &[]).await;
    assert_eq!(location(&response), detail);

    let post = db::posts::get(&app.state.db_pool, post_id).await.unwrap().unwrap();
    assert_eq!(post.text, "Original text");

    let leo_cookie = app.login("leo").await;
    let response = app
        .post_multipart(&format!("{detail}/edit"), Some(&leo_cookie), &[("text", "Edited text")], &[])
        .await;
    assert_eq!(location(&response), detail);
    let post = db::posts::get(&app.state.db_pool, post_id).await.unwrap().unwrap();
    assert_eq!(post.text, "Edited text");

    let response = app.get(&format!("{detail}/delete"), Some(&leo_cookie)).await;
    assert_eq!(location(&response), "/profile/leo");
    assert!(db::posts::get(&app.state.db_pool, post_id).await.unwrap().is_none());
}

#[tokio::test]
async fn edit_keeps_image_when_none_uploaded() {
    let app = TestApp::new().await;
    app.user("leo").await;
    let cookie = app.login("leo").await;
    let image = png();
    app.post_multipart("/create", Some(&cookie), &[("text", "With picture")], &[("image", "a.png", image.as_slice())])
        .await;

    let posts = db::posts::list(&app.state.db_pool, &Feed::All { search: None }, 10, 0)
        .await
        .unwrap();
    let before = posts[0].clone();
    assert!(before.image.is_some());

    app.post_multipart(
        &format!("/posts/{}/edit", before.id),
        Some(&cookie),
        &[("text", "Still with picture")],
        &[],
    )
    .await;

    let after = db::posts::get(&app.state.db_pool, before.id).await.unwrap().unwrap();
    assert_eq!(after.text, "Still with picture");
    assert_eq!(after.image, before.image);
}

#[tokio::test]
async fn comments_need_text() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    app.user("mia").await;
    let post_id = app.post(&leo, "Talk to me", None).await;
    let detail = format!("/posts/{post_id}");
    let cookie = app.login("mia").await;

    let response = app
        .post_form(&format!("{detail}/comment"), Some(&cookie), &[("text", "")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("This field is required."));
    assert!(db::comments::for_post(&app.state.db_pool, post_id).await.unwrap().is_empty());

    let response = app
        .post_form(&format!("{detail}/comment"), Some(&cookie), &[("text", "First!")])
        .await;
    assert_eq!(location(&response), detail);
    app.post_form(&format!("{detail}/comment"), Some(&cookie), &[("text", "Second!")])
        .await;

    let page = text(app.get(&detail, None).await).await;
    let first = page.find("First!").unwrap();
    let second = page.find("Second!").unwrap();
    assert!(second < first, "newest comment comes first");

    let response = app.get(&format!("{detail}/comment"), Some(&cookie)).await;
    assert_eq!(location(&response), detail);
}

#[tokio::test]
async fn follow_is_idempotent_and_never_self() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let mia = app.user("mia").await;
    app.user("max").await;
    app.post(&leo, "From Leo", None).await;
    let cookie = app.login("mia").await;

    for _ in 0..2 {
        let response = app.get("/profile/leo/follow", Some(&cookie)).await;
        assert_eq!(location(&response), "/profile/leo");
    }
    let pairs = db::follows::count_pairs(&app.state.db_pool, mia.id, leo.id).await.unwrap();
    assert_eq!(pairs, 1);

    let response = app.get("/profile/mia/follow", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/mia");
    let pairs = db::follows::count_pairs(&app.state.db_pool, mia.id, mia.id).await.unwrap();
    assert_eq!(pairs, 0);

    let feed = text(app.get("/follow", Some(&cookie)).await).await;
    assert!(feed.contains("From Leo"));
    let max = app.login("max").await;
    let feed = text(app.get("/follow", Some(&max)).await).await;
    assert!(!feed.contains("From Leo"));

    let profile = text(app.get("/profile/leo", Some(&cookie)).await).await;
    assert!(profile.contains("/profile/leo/unfollow"));

    let response = app.post_form("/profile/leo/unfollow", Some(&cookie), &[]).await;
    assert_eq!(location(&response), "/profile/leo");
    assert!(!db::follows::is_following(&app.state.db_pool, mia.id, leo.id).await.unwrap());

    let response = app.get("/profile/leo/unfollow", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo");

    let response = app.get("/profile/ghost/unfollow", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feeds_are_scoped() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let mia = app.user("mia").await;
    let cats = app.group("Cats", "cats").await;
    app.group("Dogs", "dogs").await;
    app.post(&leo, "Leo about cats", Some(cats.id)).await;
    app.post(&mia, "Mia without a group", None).await;

    let page = text(app.get("/group/cats", None).await).await;
    assert!(page.contains("Leo about cats"));
    assert!(!page.contains("Mia without a group"));

    let page = text(app.get("/group/dogs", None).await).await;
    assert_eq!(post_count(&page), 0);

    let page = text(app.get("/profile/mia", None).await).await;
    assert!(page.contains("Mia without a group"));
    assert!(!page.contains("Leo about cats"));
    assert!(page.contains("Posts: 1"));
}

#[tokio::test]
async fn home_feed_is_cached_until_cleared() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    app.post(&leo, "Before the cache", None).await;

    let page = text(app.get("/", None).await).await;
    assert!(page.contains("Before the cache"));

    app.post(&leo, "After the cache", None).await;
    let page = text(app.get("/", None).await).await;
    assert!(!page.contains("After the cache"));

    app.state.cache.clear();
    let page = text(app.get("/", None).await).await;
    assert!(page.contains("After the cache"));
}

#[tokio::test]
async fn pages_hold_ten_posts() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    for i in 0..13 {
        app.post(&leo, &format!("Post number {i}"), None).await;
    }

    let first = text(app.get("/", None).await).await;
    assert_eq!(post_count(&first), 10);
    assert!(first.contains("Post number 12"));
    assert!(first.contains("?page=2"));

    let second = text(app.get("/?page=2", None).await).await;
    assert_eq!(post_count(&second), 3);
    assert!(second.contains("Post number 0"));

    let clamped = text(app.get("/profile/leo?page=99", None).await).await;
    assert_eq!(post_count(&clamped), 3);
    let junk = text(app.get("/profile/leo?page=abc", None).await).await;
    assert_eq!(post_count(&junk), 10);
}

#[tokio::test]
async fn search_matches_simple_case_variants() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    app.post(&leo, "hello there", None).await;
    app.post(&leo, "Hello World", None).await;
    app.post(&leo, "HELLO AGAIN", None).await;
    app.post(&leo, "goodbye", None).await;

    let page = text(app.get("/?search=hello", None).await).await;
    assert_eq!(post_count(&page), 3);
    assert!(!page.contains("goodbye"));
    assert!(page.contains("value=\"hello\""));
}

#[tokio::test]
async fn avatar_upload_keeps_one_profile() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    app.user("mia").await;
    let cookie = app.login("leo").await;
    let image = png();

    let response = app
        .post_multipart("/profile/leo/avatar", Some(&cookie), &[], &[("avatar", "me.png", image.as_slice())])
        .await;
    assert_eq!(location(&response), "/profile/leo");
    let first = db::profiles::for_user(&app.state.db_pool, leo.id).await.unwrap().unwrap();
    assert!(first.avatar.is_some());

    app.post_multipart("/profile/leo/avatar", Some(&cookie), &[], &[("avatar", "me2.png", image.as_slice())])
        .await;
    let second = db::profiles::for_user(&app.state.db_pool, leo.id).await.unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_ne!(second.avatar, first.avatar);
    assert_eq!(db::profiles::count_for_user(&app.state.db_pool, leo.id).await.unwrap(), 1);

    let page = text(app.get("/profile/leo", None).await).await;
    assert!(page.contains("class=\"avatar\""));

    let response = app
        .post_multipart("/profile/leo/avatar", Some(&cookie), &[], &[("avatar", "bad.png", b"nope".as_slice())])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Upload a valid image."));

    let response = app.get("/profile/mia/avatar", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/mia");
}

#[tokio::test]
async fn group_slugs_are_derived_and_unique() {
    let app = TestApp::new().await;
    app.user("leo").await;
    let cookie = app.login("leo").await;

    let response = app
        .post_form(
            "/group/new",
            Some(&cookie),
            &[("title", "Rust Lovers"), ("slug", ""), ("description", "Crabs")],
        )
        .await;
    assert_eq!(location(&response), "/group/rust-lovers");

    let response = app
        .post_form(
            "/group/new",
            Some(&cookie),
            &[("title", "Rust Lovers"), ("slug", ""), ("description", "Again")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .post_form(
            "/group/new",
            Some(&cookie),
            &[("title", "Bad"), ("slug", "Not A Slug"), ("description", "x")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deletions_cascade() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let mia = app.user("mia").await;
    let cats = app.group("Cats", "cats").await;
    let post_id = app.post(&leo, "In a group", Some(cats.id)).await;
    let mia_post = app.post(&mia, "Mia's post", None).await;
    let db_pool = &app.state.db_pool;
    db::comments::create(db_pool, mia_post, leo.id, "Nice").await.unwrap();
    db::profiles::upsert_avatar(db_pool, leo.id, Some("avatars/leo.png")).await.unwrap();
    db::follows::follow(db_pool, leo.id, mia.id).await.unwrap();
    db::follows::follow(db_pool, mia.id, leo.id).await.unwrap();

    assert!(db::groups::delete(db_pool, cats.id).await.unwrap());
    let post = db::posts::get(db_pool, post_id).await.unwrap().unwrap();
    assert_eq!(post.group_id, None);
    assert_eq!(post.group_slug, None);

    assert!(db::users::delete(db_pool, leo.id).await.unwrap());
    assert!(db::posts::get(db_pool, post_id).await.unwrap().is_none());
    assert!(db::comments::for_post(db_pool, mia_post).await.unwrap().is_empty());
    assert!(db::posts::get(db_pool, mia_post).await.unwrap().is_some());
    assert!(db::profiles::for_user(db_pool, leo.id).await.unwrap().is_none());
    assert_eq!(db::follows::count_pairs(db_pool, leo.id, mia.id).await.unwrap(), 0);
    assert_eq!(db::follows::count_pairs(db_pool, mia.id, leo.id).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_things_are_404() {
    let app = TestApp::new().await;
    for uri in ["/nowhere", "/posts/not-a-uuid", "/group/ghosts", "/profile/ghost"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    let missing = format!("/posts/{}", uuid::Uuid::now_v7());
    assert_eq!(app.get(&missing, None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_shows_author_post_count() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let mia = app.user("mia").await;
    let post_id = app.post(&leo, "First of two", None).await;
    app.post(&leo, "Second of two", None).await;
    app.post(&mia, "Not counted", None).await;

    let page = text(app.get(&format!("/posts/{post_id}"), None).await).await;
    assert!(page.contains("First of two"));
    assert!(page.contains("(2 posts)"));
}

#[tokio::test]
async fn write_that_matches_no_row_is_404() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let post_id = app.post(&leo, "Stubborn", None).await;
    let cookie = app.login("leo").await;
    for trigger in [
        "CREATE TRIGGER skip_update BEFORE UPDATE ON posts BEGIN SELECT RAISE(IGNORE); END",
        "CREATE TRIGGER skip_delete BEFORE DELETE ON posts BEGIN SELECT RAISE(IGNORE); END",
    ] {
        sqlx::query(trigger).execute(&app.state.db_pool).await.unwrap();
    }

    let response = app
        .post_multipart(&format!("/posts/{post_id}/edit"), Some(&cookie), &[("text", "Changed")], &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_form(&format!("/posts/{post_id}/delete"), Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let post = db::posts::get(&app.state.db_pool, post_id).await.unwrap().unwrap();
    assert_eq!(post.text, "Stubborn");
}

#[tokio::test]
async fn failed_write_leaves_no_upload_behind() {
    let app = TestApp::new().await;
    app.user("leo").await;
    let cookie = app.login("leo").await;
    sqlx::query("CREATE TRIGGER no_posts BEFORE INSERT ON posts BEGIN SELECT RAISE(ABORT, 'closed'); END")
        .execute(&app.state.db_pool)
        .await
        .unwrap();

    let image = png();
    let response = app
        .post_multipart("/create", Some(&cookie), &[("text", "Doomed")], &[("image", "a.png", image.as_slice())])
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(media_files(&app, "posts"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_edits_all_land() {
    let app = TestApp::on_disk().await;
    let leo = app.user("leo").await;
    let post_id = app.post(&leo, "Contended", None).await;
    let cookie = app.login("leo").await;

    let mut edits = Vec::new();
    for i in 0..8 {
        let edit_text = format!("Edit {i}");
        let request = axum::http::Request::post(format!("/posts/{post_id}/edit"))
            .header(axum::http::header::COOKIE, cookie.as_str())
            .header(
                axum::http::header::CONTENT_TYPE,
                "multipart/form-data; boundary=yatube-test-boundary",
            )
            .body(axum::body::Body::from(common::multipart_body(
                &[("text", edit_text.as_str())],
                &[],
            )))
            .unwrap();
        let router = app.app.clone();
        edits.push(tokio::spawn(async move {
            tower::ServiceExt::oneshot(router, request).await.unwrap().status()
        }));
    }
    for edit in edits {
        assert_eq!(edit.await.unwrap(), StatusCode::SEE_OTHER);
    }

    let post = db::posts::get(&app.state.db_pool, post_id).await.unwrap().unwrap();
    assert!(post.text.starts_with("Edit "));
}
