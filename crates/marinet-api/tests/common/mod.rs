#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use marinet_api::tutor::{ResponseGenerator, TutorBridge, TutorError};
use marinet_api::uploads::UploadStore;
use marinet_api::{AppState, AppStateInner};
use marinet_db::Database;

pub const SECRET: &str = "test-secret";
const BOUNDARY: &str = "marinet-test-boundary";

/// Tutor backend that answers with a fixed text, or fails when `None`.
pub struct Scripted(pub Option<&'static str>);

impl ResponseGenerator for Scripted {
    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, TutorError>> {
        let out = self
            .0
            .map(str::to_string)
            .ok_or(TutorError::Status { status: 503, body: "unavailable".into() });
        async move { out }.boxed()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    upload_dir: PathBuf,
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(Scripted(None), false)
    }

    pub fn with_options(tutor: Scripted, mentions_on_vote: bool) -> Self {
        let upload_dir = std::env::temp_dir().join(format!("marinet-api-test-{}", Uuid::new_v4()));
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            tutor: TutorBridge::new(Arc::new(tutor), Duration::from_secs(2)),
            uploads: UploadStore::new(upload_dir.clone()),
            mentions_on_vote,
        });
        let router = marinet_api::router(state.clone(), 1024 * 1024);
        Self { state, router, upload_dir }
    }

    /// Names of the files currently in the upload directory.
    pub fn stored_uploads(&self) -> Vec<String> {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Bytes of a stored upload, looked up by its public URL.
    pub fn read_upload(&self, url: &str) -> Vec<u8> {
        let file_name = url.rsplit('/').next().unwrap();
        std::fs::read(self.upload_dir.join(file_name)).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Send and decode a success body, asserting the expected status.
    pub async fn expect<T: DeserializeOwned>(&self, req: Request<Body>, status: StatusCode) -> T {
        let (got, body) = self.send(req).await;
        assert_eq!(got, status, "unexpected status, body: {body}");
        serde_json::from_value(body).unwrap()
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let req = json_request(
            "POST",
            "/auth/register",
            None,
            serde_json::json!({
                "username": username,
                "email": format!("{username}@campus.edu"),
                "password": "secret123",
            }),
        );
        let body: Value = self.expect(req, StatusCode::CREATED).await;
        TestUser {
            id: body["user_id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Create a feed post (or a group post when `group` is set) and return its id.
    pub async fn post(&self, user: &TestUser, group: Option<Uuid>, content: &str) -> Uuid {
        let uri = match group {
            Some(g) => format!("/create_group_post/{g}"),
            None => "/create_post".to_string(),
        };
        let body: Value = self
            .expect(multipart_request(&uri, user, &[("content", content)]), StatusCode::CREATED)
            .await;
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn create_group(&self, user: &TestUser, name: &str) -> Uuid {
        let req = json_request("POST", "/create_group", Some(user), serde_json::json!({ "name": name }));
        let body: Value = self.expect(req, StatusCode::CREATED).await;
        body["group_id"].as_str().unwrap().parse().unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

fn authorized(builder: axum::http::request::Builder, user: Option<&TestUser>) -> axum::http::request::Builder {
    match user {
        Some(u) => builder.header(header::AUTHORIZATION, format!("Bearer {}", u.token)),
        None => builder,
    }
}

pub fn get(uri: &str, user: Option<&TestUser>) -> Request<Body> {
    authorized(Request::builder().method("GET").uri(uri), user)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str, user: &TestUser) -> Request<Body> {
    authorized(Request::builder().method("POST").uri(uri), Some(user))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, user: Option<&TestUser>, body: Value) -> Request<Body> {
    authorized(Request::builder().method(method).uri(uri), user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// URL-encoded form; values must already be encoded.
pub fn form_request(uri: &str, user: &TestUser, body: &str) -> Request<Body> {
    authorized(Request::builder().method("POST").uri(uri), Some(user))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn multipart_request(uri: &str, user: &TestUser, fields: &[(&str, &str)]) -> Request<Body> {
    multipart_with_file(uri, user, fields, None)
}

/// Multipart body with text `fields` and an optional `(field, file_name, bytes)` part.
pub fn multipart_with_file(
    uri: &str,
    user: &TestUser,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((name, file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    authorized(Request::builder().method("POST").uri(uri), Some(user))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}
