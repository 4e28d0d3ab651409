//! Defines the state shared across the Axum application.
use crate::{
    services::{sessions::store::SessionStore, snippets::SnippetStore, users::UserStore},
    templates::Templates,
};
use std::sync::Arc;

#[derive(Clone)]
/// The state struct shared across routers. Every field is cheap to clone and
/// immutable or internally synchronised, so requests share it freely.
pub struct AppState {
    /// Where snippets are stored.
    pub snippets: Arc<dyn SnippetStore>,
    /// Where user accounts are stored.
    pub users: Arc<dyn UserStore>,
    /// The backend holding session data between requests.
    pub session_store: Arc<dyn SessionStore>,
    /// Page templates, parsed once at startup.
    pub templates: Arc<Templates>,
}
