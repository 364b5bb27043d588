mod common;

use axum::http::StatusCode;
use serde_json::Value;

use common::*;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR-not-a-real-image";

#[tokio::test]
async fn post_image_is_stored_intact() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let req = multipart_with_file(
        "/create_post",
        &alice,
        &[("content", "Sunset over the quad")],
        Some(("image", "sunset.png", PNG)),
    );
    let item: Value = app.expect(req, StatusCode::CREATED).await;

    let url = item["image_url"].as_str().unwrap();
    assert!(url.starts_with("/static/uploads/"));
    assert!(url.ends_with("_sunset.png"));
    assert_eq!(app.read_upload(url), PNG);
    assert_eq!(app.stored_uploads().len(), 1);
}

#[tokio::test]
async fn image_alone_is_a_valid_post() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let req = multipart_with_file("/create_post", &alice, &[("content", "")], Some(("image", "a.gif", &b"GIF89a"[..])));
    let item: Value = app.expect(req, StatusCode::CREATED).await;
    assert_eq!(item["content"], "");
    assert!(item["image_url"].is_string());
}

#[tokio::test]
async fn rejected_posts_leave_no_image_behind() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let group = app.create_group(&alice, "Photography").await;

    let outsider = multipart_with_file(
        &format!("/create_group_post/{group}"),
        &bob,
        &[("content", "Can I join?")],
        Some(("image", "cat.png", PNG)),
    );
    assert_eq!(app.send(outsider).await.0, StatusCode::FORBIDDEN);
    assert!(app.stored_uploads().is_empty());

    let long = "x".repeat(901);
    let too_long = multipart_with_file("/create_post", &alice, &[("content", &long)], Some(("image", "cat.png", PNG)));
    assert_eq!(app.send(too_long).await.0, StatusCode::BAD_REQUEST);
    assert!(app.stored_uploads().is_empty());
}

#[tokio::test]
async fn unsupported_extensions_are_ignored() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let req = multipart_with_file(
        "/create_post",
        &alice,
        &[("content", "notes attached")],
        Some(("image", "notes.txt", &b"plain text"[..])),
    );
    let item: Value = app.expect(req, StatusCode::CREATED).await;
    assert!(item["image_url"].is_null());
    assert!(app.stored_uploads().is_empty());
}

#[tokio::test]
async fn settings_keep_omitted_fields() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let rename = multipart_request("/settings", &alice, &[("username", "alice_k"), ("bio", "Physics major")]);
    let profile: Value = app.expect(rename, StatusCode::OK).await;
    assert_eq!(profile["username"], "alice_k");

    // The token still carries the old name; it must not be written back.
    let bio_only = multipart_request("/settings", &alice, &[("bio", "Physics and math")]);
    let profile: Value = app.expect(bio_only, StatusCode::OK).await;
    assert_eq!(profile["username"], "alice_k");
    assert_eq!(profile["bio"], "Physics and math");

    let avatar_only = multipart_with_file("/settings", &alice, &[], Some(("avatar", "me.jpg", &b"\xff\xd8\xff"[..])));
    let profile: Value = app.expect(avatar_only, StatusCode::OK).await;
    assert_eq!(profile["username"], "alice_k");
    assert_eq!(profile["bio"], "Physics and math");
    let avatar = profile["avatar_url"].as_str().unwrap();
    assert_eq!(app.read_upload(avatar), b"\xff\xd8\xff");
}

#[tokio::test]
async fn rejected_settings_leave_no_avatar_behind() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    app.register("bob").await;

    let bad_name = multipart_with_file(
        "/settings",
        &alice,
        &[("username", "ab²")],
        Some(("avatar", "me.png", PNG)),
    );
    assert_eq!(app.send(bad_name).await.0, StatusCode::BAD_REQUEST);

    let taken = multipart_with_file("/settings", &alice, &[("username", "bob")], Some(("avatar", "me.png", PNG)));
    assert_eq!(app.send(taken).await.0, StatusCode::CONFLICT);

    assert!(app.stored_uploads().is_empty());
}
