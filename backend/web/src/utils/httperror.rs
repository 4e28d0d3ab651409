//! HTTP error handling and automated response generation
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core::fmt::Display;

use crate::{db::errors::DatabaseError, services::sessions::errors::SessionStorageError};

/// Represents an HTTP status code, optionally with a custom message.
#[derive(Debug)]
pub struct HttpError {
    /// The numeric HTTP status code to respond with.
    status: StatusCode,
    /// The message to include in the response.
    message: Option<String>,
}

impl From<StatusCode> for HttpError {
    fn from(err: StatusCode) -> Self {
        Self {
            status: err,
            message: None,
        }
    }
}

impl HttpError {
    /// Construct a new HTTP error with a given status code and message.
    pub const fn new(status: StatusCode, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// A fault on our side. The cause is logged with full detail and the
    /// client only ever sees a generic 500.
    pub fn server_error(err: &dyn Display) -> Self {
        tracing::error!(error = %err, "Server error while handling request");
        StatusCode::INTERNAL_SERVER_ERROR.into()
    }

    /// A problem with the request the client sent.
    pub fn client_error(status: StatusCode) -> Self {
        status.into()
    }

    pub fn not_found() -> Self {
        Self::client_error(StatusCode::NOT_FOUND)
    }

    /// The status this error will be reported with.
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let message = self
            .message
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or("").to_owned());
        (self.status, format!("{message}\n")).into_response()
    }
}

impl From<DatabaseError> for HttpError {
    fn from(err: DatabaseError) -> Self {
        Self::server_error(&err)
    }
}

impl From<SessionStorageError> for HttpError {
    fn from(err: SessionStorageError) -> Self {
        Self::server_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn server_errors_do_not_leak_detail() {
        let err = HttpError::server_error(&"connection refused (os error 111)");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"Internal Server Error\n");
    }

    #[tokio::test]
    async fn custom_message_replaces_reason() {
        let response =
            HttpError::new(StatusCode::BAD_REQUEST, Some(String::from("bad token"))).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"bad token\n");
    }
}
