//! Composable middleware chains for routes that need session state.
use super::{
    auth::{authenticate, require_authentication},
    csrf::no_surf,
    session::load_and_save,
};
use crate::state::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::MethodRouter,
};

/// One step of a route-level chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Middleware {
    /// Load the session at entry and save it on the way out.
    LoadAndSave,
    /// Issue and check the CSRF token.
    NoSurf,
    /// Mark the request as authenticated or not.
    Authenticate,
    /// Redirect unauthenticated users to the login page.
    RequireAuthentication,
}

impl Middleware {
    fn wrap(self, route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
        match self {
            Self::LoadAndSave => route.route_layer(from_fn_with_state(state.clone(), load_and_save)),
            Self::NoSurf => route.route_layer(from_fn(no_surf)),
            Self::Authenticate => {
                route.route_layer(from_fn_with_state(state.clone(), authenticate))
            }
            Self::RequireAuthentication => route.route_layer(from_fn(require_authentication)),
        }
    }
}

/// An ordered list of middleware which can be wrapped around any handler. The
/// first entry sees the request first and the response last.
#[derive(Clone)]
pub struct Chain {
    state: AppState,
    middleware: Vec<Middleware>,
}

impl Chain {
    pub fn new(state: AppState, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        Self {
            state,
            middleware: middleware.into_iter().collect(),
        }
    }

    /// The chain used by every page that needs a session: session, then CSRF,
    /// then authentication.
    pub fn dynamic(state: AppState) -> Self {
        Self::new(
            state,
            [
                Middleware::LoadAndSave,
                Middleware::NoSurf,
                Middleware::Authenticate,
            ],
        )
    }

    /// A new chain with `middleware` added closest to the handler. The
    /// original chain is left as it was.
    #[must_use]
    pub fn append(&self, middleware: Middleware) -> Self {
        let mut chain = self.clone();
        chain.middleware.push(middleware);
        chain
    }

    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    /// Wrap `handler` in the chain. Layers only run for requests the handler
    /// accepts, so unmatched methods still fall through to the 405 response.
    pub fn then(&self, handler: MethodRouter<AppState>) -> MethodRouter<AppState> {
        self.middleware
            .iter()
            .rev()
            .fold(handler, |route, middleware| middleware.wrap(route, &self.state))
    }
}
