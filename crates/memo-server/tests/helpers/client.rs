//! Test client helpers.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use memo_server::{AppState, create_router, metrics::setup::detached_handle};
use serde_json::Value;
use tower::ServiceExt;

/// Drives the router in-process, one request at a time.
pub struct TestClient {
    app: Router,
    state: AppState,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: create_router(state.clone(), detached_handle()),
            state,
        }
    }

    /// The state behind the router, for arranging or inspecting the store.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None, None).await
    }

    /// GET as the given user.
    pub async fn get_as(&self, user: &str, uri: &str) -> TestResponse {
        self.send("GET", uri, Some(user), None).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: Vec<(&str, &str)>) -> TestResponse {
        let mut builder = Request::builder().uri(uri).method("GET");

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a JSON body, optionally as a user.
    pub async fn post_json(&self, user: Option<&str>, uri: &str, body: Value) -> TestResponse {
        self.send("POST", uri, user, Some(body.to_string())).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send("PUT", uri, None, Some(body.to_string())).await
    }

    /// PUT a raw body, for malformed payloads.
    pub async fn put_raw(&self, uri: &str, body: &str) -> TestResponse {
        self.send("PUT", uri, None, Some(body.to_string())).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send("DELETE", uri, None, None).await
    }

    /// Sends a memo and returns its id.
    pub async fn send_memo(&self, from: &str, body: Value) -> String {
        let response = self.post_json(Some(from), "/api/memos", body).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<String>,
    ) -> TestResponse {
        let mut builder = Request::builder().uri(uri).method(method);

        if let Some(user) = user {
            builder = builder.header("x-user-email", user);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json)
            },
            None => Body::empty(),
        };

        self.request(builder.body(body).unwrap()).await
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        TestResponse::from_response(response).await
    }
}

/// Wrapper over Response with assertion helpers.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn from_response(response: Response<Body>) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Body is not valid UTF-8")
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    pub fn assert_content_type_contains(&self, expected: &str) -> &Self {
        let content_type = self
            .header("content-type")
            .expect("Response missing Content-Type header");

        assert!(
            content_type.contains(expected),
            "Expected Content-Type to contain '{}' but got '{}'",
            expected,
            content_type
        );
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(
            self.headers.contains_key(name),
            "Expected header '{}' to exist",
            name
        );
        self
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let value = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));

        assert_eq!(
            value, expected,
            "Expected header '{}' to be '{}' but got '{}'",
            name, expected, value
        );
        self
    }

    /// Asserts the `{ error, message }` body of an error response.
    pub fn assert_error(&self, expected: StatusCode) -> Value {
        self.assert_status(expected);
        let body: Value = self.json();
        assert!(body["error"].is_string(), "missing 'error' in {}", body);
        assert!(body["message"].is_string(), "missing 'message' in {}", body);
        body
    }
}

/// A client over a fresh in-memory store.
pub fn client() -> TestClient {
    TestClient::new(AppState::in_memory())
}
