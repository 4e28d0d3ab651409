//! The request pipeline. A standard chain of recovery, logging and security
//! headers wraps the whole router, and a dynamic chain of session, CSRF and
//! authentication middleware wraps individual routes.
pub mod auth;
pub mod chain;
pub mod csrf;
pub mod headers;
pub mod logging;
pub mod recover;
pub mod session;

pub use chain::{Chain, Middleware};
