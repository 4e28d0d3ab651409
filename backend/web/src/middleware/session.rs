//! Loads the request's session from the session store and writes it back once
//! the rest of the chain has produced a response.
use crate::{
    constants::sessions::{SESSION_COOKIE, SESSION_COOKIE_SECURE},
    services::sessions::Session,
    state::AppState,
    utils::httperror::HttpError,
};
use axum::{
    extract::{Request, State},
    http::{header::VARY, HeaderValue},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};

/// Middleware which resolves the session cookie into a [`Session`] available as
/// a request extension, then persists whatever the handler did to it.
///
/// A missing, unknown or expired token starts a fresh session; it is never an
/// error. Each request costs exactly one load and one save, and a store failure
/// on either side fails the request with a 500.
pub async fn load_and_save(
    State(state): State<AppState>,
    cookie_jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let session = match cookie_jar.get(SESSION_COOKIE) {
        Some(cookie) => state
            .session_store
            .load(cookie.value())
            .await?
            .map_or_else(Session::new, |record| {
                Session::loaded(cookie.value().to_owned(), record)
            }),
        None => Session::new(),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    let commit = session.commit();
    if let Some(ref stale_token) = commit.stale_token {
        state.session_store.destroy(stale_token).await?;
    }
    let cookie_jar = if let Some(ref record) = commit.record {
        state.session_store.save(&commit.token, record).await?;
        cookie_jar.add(
            Cookie::build((SESSION_COOKIE, commit.token))
                .path("/")
                .http_only(true)
                .secure(SESSION_COOKIE_SECURE)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(
                    i64::try_from(session.remaining_seconds()).unwrap_or(0),
                )),
        )
    } else {
        state.session_store.destroy(&commit.token).await?;
        cookie_jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    };
    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Cookie"));
    Ok((cookie_jar, response).into_response())
}
