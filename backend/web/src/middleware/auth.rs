//! Middleware used for checking user authentication.
use crate::{
    constants::sessions::AUTHENTICATED_USER_ID, services::sessions::Session, state::AppState,
    utils::httperror::HttpError,
};
use axum::{
    extract::{Request, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::Next,
    response::{IntoResponse as _, Redirect, Response},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Whether the request belongs to a logged in user whose account still exists.
pub struct IsAuthenticated(pub bool);

/// Middleware which annotates the request with [`IsAuthenticated`]. The user ID
/// held by the session is re-checked against the user store on every request,
/// since accounts can be deleted while sessions live on. Never rejects a
/// request by itself.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let user_id = req
        .extensions()
        .get::<Session>()
        .and_then(|session| session.get::<i64>(AUTHENTICATED_USER_ID));
    let authenticated = match user_id {
        Some(id) => {
            let exists = state.users.exists(id).await?;
            if !exists {
                tracing::info!(user_id = id, "Session refers to an account that no longer exists");
            }
            exists
        }
        None => false,
    };
    req.extensions_mut().insert(IsAuthenticated(authenticated));
    Ok(next.run(req).await)
}

/// Middleware which sends unauthenticated users to the login page. Pages behind
/// it are marked uncacheable.
pub async fn require_authentication(req: Request, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<IsAuthenticated>()
        .is_some_and(|&IsAuthenticated(authenticated)| authenticated);
    if !authenticated {
        return Redirect::to("/user/login").into_response();
    }
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
