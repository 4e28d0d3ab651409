//! HTML page rendering. Every template is parsed once at startup into an
//! immutable cache shared by all requests.
use crate::{
    constants::sessions::FLASH,
    middleware::{auth::IsAuthenticated, csrf::CsrfToken},
    services::sessions::Session,
    utils::httperror::HttpError,
};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse as _, Response},
};
use core::convert::Infallible;
use serde::Serialize;
use tera::{Context, Tera};
use time::OffsetDateTime;

/// Template sources, embedded so the binary is self-contained.
const TEMPLATES: [(&str, &str); 7] = [
    ("base.html", include_str!("../ui/html/base.html")),
    ("nav.html", include_str!("../ui/html/partials/nav.html")),
    ("home.html", include_str!("../ui/html/pages/home.html")),
    ("view.html", include_str!("../ui/html/pages/view.html")),
    ("create.html", include_str!("../ui/html/pages/create.html")),
    ("signup.html", include_str!("../ui/html/pages/signup.html")),
    ("login.html", include_str!("../ui/html/pages/login.html")),
];

/// The parsed template cache.
pub struct Templates(Tera);

impl Templates {
    /// Parse every page template. Fails if any of them is malformed.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self(tera))
    }

    /// Render a page to a string, then wrap it in a response with `status`. A
    /// rendering failure becomes a 500 and nothing partial is sent.
    pub fn render(
        &self,
        status: StatusCode,
        page: &str,
        data: TemplateData,
    ) -> Result<Response, HttpError> {
        let body = self
            .0
            .render(page, &data.into_context())
            .map_err(|err| HttpError::server_error(&RenderError(page.to_owned(), err)))?;
        Ok((status, Html(body)).into_response())
    }
}

/// Carries the page name along with tera's error so logs say which page broke.
#[derive(Debug, thiserror::Error)]
#[error("failed to render template {0}: {1:?}")]
struct RenderError(String, tera::Error);

/// The data available to every page, plus whatever a handler adds.
pub struct TemplateData {
    context: Context,
    session: Option<Session>,
}

impl TemplateData {
    /// Add a page-specific value.
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.context.insert(key, value);
    }

    /// Finish the context. The flash message is consumed only now, so a
    /// handler that redirects instead of rendering leaves it for the next page.
    fn into_context(self) -> Context {
        let mut context = self.context;
        let flash = self
            .session
            .and_then(|session| session.pop::<String>(FLASH));
        context.insert("flash", &flash);
        context
    }
}

impl<S: Send + Sync> FromRequestParts<S> for TemplateData {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut context = Context::new();
        context.insert("current_year", &OffsetDateTime::now_utc().year());
        let is_authenticated = parts
            .extensions
            .get::<IsAuthenticated>()
            .is_some_and(|&IsAuthenticated(authenticated)| authenticated);
        context.insert("is_authenticated", &is_authenticated);
        let csrf_token = parts
            .extensions
            .get::<CsrfToken>()
            .map(|CsrfToken(token)| token.clone());
        context.insert("csrf_token", &csrf_token);
        Ok(Self {
            context,
            session: parts.extensions.get::<Session>().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_data(session: Option<Session>) -> TemplateData {
        TemplateData {
            context: Context::new(),
            session,
        }
    }

    #[test]
    fn all_templates_parse() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn flash_is_consumed_on_render() {
        let session = Session::new();
        session.put(FLASH, "Saved!");
        let context = empty_data(Some(session.clone())).into_context();
        assert_eq!(
            context.get("flash").and_then(|v| v.as_str()),
            Some("Saved!")
        );
        assert!(!session.contains(FLASH));
    }

    #[test]
    fn rendering_unknown_page_is_server_error() {
        let templates = Templates::new().expect("templates");
        let err = templates
            .render(StatusCode::OK, "missing.html", empty_data(None))
            .expect_err("unknown page");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
