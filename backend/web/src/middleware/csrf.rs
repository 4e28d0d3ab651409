//! Anti-forgery protection for state-changing requests.
use crate::{
    constants::{
        forms::{CSRF_FIELD, CSRF_HEADER, MAX_FORM_BYTES},
        sessions::CSRF_TOKEN,
    },
    services::sessions::{generate_token, Session},
    utils::httperror::HttpError,
};
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use subtle::ConstantTimeEq as _;

/// The CSRF token of the current session, made available to templates so forms
/// can embed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Methods which must not change state and so are never checked.
fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Middleware which issues a CSRF token for each session and rejects unsafe
/// requests that do not present it, either in the `X-CSRF-Token` header or in
/// the `csrf_token` field of a URL-encoded form. The token is not rotated once
/// issued. Requires [`super::session::load_and_save`] to have run first.
pub async fn no_surf(mut req: Request, next: Next) -> Result<Response, HttpError> {
    let session = req
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| HttpError::server_error(&"CSRF check reached without a loaded session"))?;
    let expected = session.get::<String>(CSRF_TOKEN).unwrap_or_else(|| {
        let token = generate_token();
        session.put(CSRF_TOKEN, token.clone());
        token
    });
    req.extensions_mut().insert(CsrfToken(expected.clone()));

    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let (submitted, req) = submitted_token(req).await?;
    let matches = submitted
        .is_some_and(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())));
    if !matches {
        tracing::info!(
            method = %req.method(),
            uri = %req.uri(),
            "Rejected request with missing or invalid CSRF token"
        );
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            Some(String::from("Bad Request: invalid CSRF token")),
        ));
    }
    Ok(next.run(req).await)
}

/// Find the token the client submitted. Reading a form body consumes it, so the
/// request is rebuilt around the buffered bytes for the handler. A body over
/// [`MAX_FORM_BYTES`] is refused with a 413.
async fn submitted_token(req: Request) -> Result<(Option<String>, Request), HttpError> {
    if let Some(value) = req.headers().get(CSRF_HEADER) {
        let token = value.to_str().ok().map(str::to_owned);
        return Ok((token, req));
    }
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_form_content_type);
    if !is_form {
        return Ok((None, req));
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|err| {
        tracing::info!(error = %err, "Could not read form body");
        if err.into_inner().downcast_ref::<LengthLimitError>().is_some() {
            HttpError::client_error(StatusCode::PAYLOAD_TOO_LARGE)
        } else {
            HttpError::client_error(StatusCode::BAD_REQUEST)
        }
    })?;
    let token = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned());
    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

/// Media types are case-insensitive and may carry parameters.
fn is_form_content_type(value: &str) -> bool {
    value.split(';').next().is_some_and(|essence| {
        essence
            .trim()
            .eq_ignore_ascii_case("application/x-www-form-urlencoded")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unsafe_methods_are_checked() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }

    #[tokio::test]
    async fn form_body_survives_token_extraction() {
        let req = Request::builder()
            .method(Method::POST)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Hi&csrf_token=abc%2B1"))
            .expect("request");
        let (token, req) = submitted_token(req).await.expect("token");
        assert_eq!(token.as_deref(), Some("abc+1"));
        let body = to_bytes(req.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"title=Hi&csrf_token=abc%2B1");
    }

    #[test]
    fn form_content_type_ignores_case_and_parameters() {
        assert!(is_form_content_type("application/x-www-form-urlencoded"));
        assert!(is_form_content_type(
            "Application/X-WWW-Form-URLEncoded; charset=UTF-8"
        ));
        assert!(!is_form_content_type("application/json"));
        assert!(!is_form_content_type("multipart/form-data; boundary=x"));
    }

    #[tokio::test]
    async fn oversized_form_is_payload_too_large() {
        let req = Request::builder()
            .method(Method::POST)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(vec![b'a'; MAX_FORM_BYTES + 1]))
            .expect("request");
        let Err(err) = submitted_token(req).await else {
            panic!("oversized body was accepted");
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn header_takes_precedence() {
        let req = Request::builder()
            .method(Method::POST)
            .header(CSRF_HEADER, "from-header")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("csrf_token=from-body"))
            .expect("request");
        let (token, _) = submitted_token(req).await.expect("token");
        assert_eq!(token.as_deref(), Some("from-header"));
    }
}
