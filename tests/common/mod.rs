#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chakrulo::db::{seed, MemoryStore, Store};
use chakrulo::domain::models::{Category, Question};
use chakrulo::domain::scoring::ScoreScale;
use chakrulo::middleware::RateLimiter;
use chakrulo::services::ai::TextGenerator;
use chakrulo::services::storage::ObjectStorage;
use chakrulo::state::AppState;
use chakrulo::web::session::sign_session;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const SESSION_KEY: &[u8] = b"test-session-key-test-session-key";
pub const BOUNDARY: &str = "chakrulo-test-boundary";

/// Generator that always answers with the same text, or always fails.
pub struct StubGenerator {
    reply: Option<String>,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { reply: None, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().ok_or_else(|| anyhow!("generator unavailable"))
    }
}

pub struct StubStorage {
    fail: bool,
}

#[async_trait]
impl ObjectStorage for StubStorage {
    async fn upload(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        if self.fail {
            return Err(anyhow!("bucket unavailable"));
        }
        Ok(format!("https://storage.test/public/{path}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub generator: Arc<StubGenerator>,
}

pub struct TestAppBuilder {
    generator: StubGenerator,
    storage_fails: bool,
    ai_rate_limit: usize,
}

impl TestAppBuilder {
    pub fn generator(mut self, generator: StubGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn failing_storage(mut self) -> Self {
        self.storage_fails = true;
        self
    }

    pub fn ai_rate_limit(mut self, limit: usize) -> Self {
        self.ai_rate_limit = limit;
        self
    }

    pub async fn build(self) -> TestApp {
        let store = MemoryStore::new();
        seed::seed_questions(&store).await.expect("seed questions");
        let generator = Arc::new(self.generator);
        let state = Arc::new(AppState {
            store: Arc::new(store.clone()),
            storage: Arc::new(StubStorage { fail: self.storage_fails }),
            ai: generator.clone(),
            session_key: SESSION_KEY.to_vec(),
            score_scale: ScoreScale::default(),
            ai_limiter: RateLimiter::new(self.ai_rate_limit, Duration::from_secs(60)),
        });
        TestApp {
            router: chakrulo::router(state),
            store,
            generator,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            generator: StubGenerator::replying("1. Walk daily\n2. Sleep eight hours"),
            storage_fails: false,
            ai_rate_limit: 20,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    /// Registers `external_id` through the API and returns the user's internal id.
    pub async fn register(&self, external_id: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/users",
                Some(external_id),
                serde_json::json!({
                    "first_name": "Giorgi",
                    "last_name": "Kapanadze",
                    "email": format!("{external_id}@example.com"),
                }),
            ))
            .await;
        assert!(response.status().is_success(), "register failed: {}", response.status());
        body_json(response).await["id"]
            .as_str()
            .expect("user id")
            .to_string()
    }

    pub async fn questions(&self, category: Category) -> Vec<Question> {
        self.store
            .questions_by_category(category)
            .await
            .expect("questions")
    }
}

pub fn token(external_id: &str) -> String {
    sign_session(external_id, SESSION_KEY).expect("sign session")
}

pub fn request(method: Method, uri: &str, principal: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(external_id) = principal {
        builder = builder.header("authorization", format!("Bearer {}", token(external_id)));
    }
    builder.body(Body::empty()).expect("request build should succeed")
}

pub fn json_request(method: Method, uri: &str, principal: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(external_id) = principal {
        builder = builder.header("authorization", format!("Bearer {}", token(external_id)));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request build should succeed")
}

pub struct FilePart<'a> {
    pub file_name: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

pub fn multipart_request(
    uri: &str,
    principal: &str,
    fields: &[(&str, String)],
    file: Option<FilePart<'_>>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        push_text_part(&mut body, name, value);
    }
    if let Some(file) = file {
        push_file_part(&mut body, "file", &file);
    }
    finish_multipart(uri, principal, body)
}

/// Sends the file under `file_field` ahead of the text fields.
pub fn file_first_multipart_request(
    uri: &str,
    principal: &str,
    file_field: &str,
    file: FilePart<'_>,
    fields: &[(&str, String)],
) -> Request<Body> {
    let mut body = Vec::new();
    push_file_part(&mut body, file_field, &file);
    for (name, value) in fields {
        push_text_part(&mut body, name, value);
    }
    finish_multipart(uri, principal, body)
}

fn push_text_part(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .as_bytes(),
    );
}

fn push_file_part(body: &mut Vec<u8>, field: &str, file: &FilePart<'_>) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{}\"\r\n",
            file.file_name
        )
        .as_bytes(),
    );
    if let Some(content_type) = file.content_type {
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(file.bytes);
    body.extend_from_slice(b"\r\n");
}

fn finish_multipart(uri: &str, principal: &str, mut body: Vec<u8>) -> Request<Body> {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(principal)))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("request build should succeed")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("should read body");
    serde_json::from_slice(&bytes).expect("should parse JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("should read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Option id of `question` carrying `value`.
pub fn option_with_value(question: &Question, value: i32) -> String {
    question
        .response_options
        .iter()
        .find(|o| o.option_value == value)
        .map(|o| o.id.to_string())
        .expect("option with value")
}
