//! Shared harness: the real router over in-memory stores.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use regex::Regex;
use snippetbox_web::{
    routes,
    services::{
        memory::{MemorySnippetStore, MemoryUserStore},
        sessions::store::{MemoryStore, SessionStore},
        users::UserStore as _,
    },
    state::AppState,
    templates::Templates,
    utils::email::EmailAddress,
};
use std::sync::{Arc, LazyLock};
use tower::ServiceExt as _;

pub const EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "pa55word!";

static CSRF_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap());

pub struct TestApp {
    pub state: AppState,
    pub snippets: Arc<MemorySnippetStore>,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let sessions = Arc::new(MemoryStore::new());
        Self::with_session_store(sessions.clone(), sessions)
    }

    /// Build an app whose session backend is `store`. `sessions` is kept for
    /// inspection and may be unrelated to `store`.
    pub fn with_session_store(store: Arc<dyn SessionStore>, sessions: Arc<MemoryStore>) -> Self {
        let snippets = Arc::new(MemorySnippetStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let state = AppState {
            snippets: snippets.clone(),
            users: users.clone(),
            session_store: store,
            templates: Arc::new(Templates::new().unwrap()),
        };
        Self {
            state,
            snippets,
            users,
            sessions,
        }
    }

    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, path, cookie, Body::empty()))
            .await
    }

    pub async fn post_form(&self, path: &str, cookie: Option<&str>, body: &str) -> Response {
        let mut req = request(Method::POST, path, cookie, Body::from(body.to_owned()));
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        self.send(req).await
    }

    /// Create Alice's account directly in the user store.
    pub async fn signup(&self) -> i64 {
        self.users
            .insert("Alice", EmailAddress::try_from(EMAIL).unwrap(), PASSWORD)
            .await
            .unwrap()
    }

    /// Log in through the login form. Returns the post-login session cookie
    /// and the CSRF token to submit with it.
    pub async fn login(&self) -> (String, String) {
        let page = self.get("/user/login", None).await;
        let cookie = session_cookie(&page).unwrap();
        let token = csrf_token(&body_text(page).await).unwrap();
        let response = self
            .post_form(
                "/user/login",
                Some(&cookie),
                &format!("email={EMAIL}&password={PASSWORD}&csrf_token={token}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/snippet/create"));
        (session_cookie(&response).unwrap(), token)
    }
}

pub fn request(method: Method, path: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).unwrap()
}

/// The `session=<token>` pair from the response's `Set-Cookie`, ready to be
/// sent back as a `Cookie` header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("session="))
        .map(str::to_owned)
}

pub fn token_of(cookie: &str) -> &str {
    cookie.trim_start_matches("session=")
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub fn csrf_token(body: &str) -> Option<String> {
    CSRF_INPUT
        .captures(body)
        .map(|captures| captures[1].to_owned())
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
