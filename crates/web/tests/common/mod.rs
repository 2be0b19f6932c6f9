#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] runs the real router, templates, and middleware stack over
//! in-memory stores and an in-memory session store, so tests need neither
//! PostgreSQL nor Redis.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use snippetbox_test_utils::{MemorySnippetStore, MemoryUserStore};
use snippetbox_web::AppState;
use snippetbox_web::routes;
use snippetbox_web::theme::ThemeEngine;

/// Project root, two levels up from this crate's manifest.
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Test application wrapper using the real routes and middleware.
pub struct TestApp {
    router: Router,
    pub snippets: Arc<MemorySnippetStore>,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let snippets = Arc::new(MemorySnippetStore::new());
        let users = Arc::new(MemoryUserStore::new());

        let theme = ThemeEngine::new(&project_root().join("templates"))
            .expect("Failed to load templates");

        let state = AppState::from_parts(
            snippets.clone(),
            users.clone(),
            Arc::new(theme),
            project_root().join("static"),
        );

        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

        let router = routes::app(state, session_layer, Duration::from_secs(10));

        Self {
            router,
            snippets,
            users,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Start a browser-like client that carries the session cookie.
    pub fn client(&self) -> Client<'_> {
        Client {
            app: self,
            cookie: None,
        }
    }
}

/// Sends requests through a [`TestApp`] while tracking the session cookie.
pub struct Client<'a> {
    app: &'a TestApp,
    cookie: Option<String>,
}

impl Client<'_> {
    pub async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("Invalid cookie header"));
        }

        let response = self.app.request(request).await;

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            let removed = pair.ends_with('=') || set_cookie.contains("Max-Age=0");
            self.cookie = if removed { None } else { Some(pair.to_string()) };
        }

        response
    }

    pub async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response {
        self.send(form_request(uri, body)).await
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

/// Build a urlencoded POST request.
pub fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body into a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The Location header of a redirect.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
}
