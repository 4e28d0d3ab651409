//! Recovery from panics raised anywhere further down the pipeline.
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse as _, Response},
};
use std::{any::Any, backtrace::Backtrace, panic};

/// Turn a panic caught by `CatchPanicLayer` into a generic 500. The connection
/// is marked for closing so that a possibly half-written exchange is never
/// reused for another request.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"));
    tracing::error!(panic = %message, "Recovered from panic while handling request");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error\n",
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Route panic reports through `tracing`, with a backtrace captured at the
/// point of the panic. Call once at startup.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map_or_else(String::new, |loc| format!("{}:{}", loc.file(), loc.line()));
        tracing::error!(
            %location,
            backtrace = %Backtrace::force_capture(),
            "Panic: {info}"
        );
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_payloads_produce_closing_500() {
        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONNECTION),
            Some(&HeaderValue::from_static("close"))
        );
    }

    #[test]
    fn opaque_payloads_are_still_handled() {
        let response = handle_panic(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
