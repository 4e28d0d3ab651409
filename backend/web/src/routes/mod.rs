//! The route table. Pages are grouped into sub-routers which are merged here
//! and wrapped in the standard middleware chain.
pub mod snippets;
pub mod users;

use crate::{
    constants::api::REQUEST_TIMEOUT,
    middleware::{
        headers::secure_headers, logging::log_request, recover::handle_panic, Chain, Middleware,
    },
    state::AppState,
    utils::httperror::HttpError,
};
use axum::{
    extract::Path,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::from_fn,
    response::{IntoResponse as _, Response},
    routing::get,
    Router,
};
use core::time::Duration;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

/// Static assets, embedded in the binary.
const STATIC_FILES: [(&str, &str, &[u8]); 2] = [
    (
        "css/main.css",
        "text/css; charset=utf-8",
        include_bytes!("../../ui/static/css/main.css"),
    ),
    (
        "js/main.js",
        "text/javascript; charset=utf-8",
        include_bytes!("../../ui/static/js/main.js"),
    ),
];

/// Build the full application: every route, wrapped in recovery, request
/// logging and security headers (outermost first).
pub fn create_router(state: AppState) -> Router {
    let dynamic = Chain::dynamic(state.clone());
    let protected = dynamic.append(Middleware::RequireAuthentication);
    wrap_standard(
        Router::new()
            .route("/static/{*filepath}", get(static_file))
            .route("/ping", get(ping))
            .merge(snippets::create_router(&dynamic, &protected))
            .merge(users::create_router(&dynamic, &protected))
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(state),
    )
}

/// Wrap a finished router in the standard chain. Recovery is outermost so a
/// panic anywhere below, including in logging or header injection, still
/// becomes a 500. The timeout sits inside the header injection so a 408 still
/// carries the security headers.
pub fn wrap_standard(router: Router) -> Router {
    wrap_standard_with_timeout(router, REQUEST_TIMEOUT)
}

/// [`wrap_standard`] with a custom request timeout.
pub fn wrap_standard_with_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(from_fn(log_request))
            .layer(from_fn(secure_headers))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            )),
    )
}

/// Liveness check. Runs outside the session machinery.
async fn ping() -> &'static str {
    "OK"
}

async fn not_found() -> HttpError {
    HttpError::not_found()
}

async fn method_not_allowed() -> HttpError {
    HttpError::client_error(StatusCode::METHOD_NOT_ALLOWED)
}

async fn static_file(Path(filepath): Path<String>) -> Result<Response, HttpError> {
    STATIC_FILES
        .iter()
        .find(|&&(path, _, _)| path == filepath)
        .map(|&(_, content_type, body)| ([(CONTENT_TYPE, content_type)], body).into_response())
        .ok_or_else(HttpError::not_found)
}
