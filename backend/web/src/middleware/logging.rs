//! Access logging for every request the server receives.
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

/// Log the remote address, protocol, method and URI of each request before
/// passing it on. The remote address is only known when the server was started
/// with connect info; otherwise `-` is logged.
pub async fn log_request(req: Request, next: Next) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| String::from("-"), |ConnectInfo(addr)| addr.to_string());
    tracing::info!(
        ip = %remote_addr,
        proto = ?req.version(),
        method = %req.method(),
        uri = %req.uri(),
        "received request"
    );
    next.run(req).await
}
