//! Snippetbox: share snippets of text for a limited time.
//!
//! Requests pass through a standard chain (panic recovery, request logging,
//! security headers) wrapping the router, and session-aware pages add a
//! dynamic chain (session load/save, CSRF guard, authentication) in front of
//! their handlers.
pub mod constants;
pub mod db;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;
pub mod utils;
