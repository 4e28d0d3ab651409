//! Pages for listing, viewing and creating snippets.
use crate::{
    constants::{
        forms::{PERMITTED_EXPIRES, TITLE_MAX_CHARS},
        sessions::FLASH,
    },
    db::models::snippet::{SnippetInsert, SnippetView},
    middleware::Chain,
    services::{sessions::Session, snippets::errors::SnippetError},
    state::AppState,
    templates::TemplateData,
    utils::{
        httperror::HttpError,
        validator::{max_chars, not_blank, permitted, Validator},
    },
};
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse as _, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use serde::{Deserialize, Serialize};

/// Create a router for the snippet pages. Creating snippets requires a login.
pub fn create_router(dynamic: &Chain, protected: &Chain) -> Router<AppState> {
    Router::new()
        .route("/", dynamic.then(get(home)))
        .route("/snippet/view/{id}", dynamic.then(get(snippet_view)))
        .route(
            "/snippet/create",
            protected.then(get(snippet_create).post(snippet_create_post)),
        )
}

/// The snippet creation form, as submitted and as re-rendered.
#[derive(Serialize, Deserialize, Default)]
pub struct SnippetCreateForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    /// Kept as text so a non-numeric value can be told apart from a
    /// disallowed one.
    #[serde(default)]
    expires: String,
    #[serde(skip_deserializing)]
    validator: Validator,
}

async fn home(
    State(state): State<AppState>,
    mut data: TemplateData,
) -> Result<Response, HttpError> {
    let snippets: Vec<SnippetView> = state
        .snippets
        .latest()
        .await?
        .iter()
        .map(SnippetView::from)
        .collect();
    data.insert("snippets", &snippets);
    state.templates.render(StatusCode::OK, "home.html", data)
}

async fn snippet_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut data: TemplateData,
) -> Result<Response, HttpError> {
    let id = id
        .parse::<i64>()
        .ok()
        .filter(|&id| id >= 1)
        .ok_or_else(HttpError::not_found)?;
    let snippet = state.snippets.get(id).await?;
    data.insert("snippet", &SnippetView::from(&snippet));
    state.templates.render(StatusCode::OK, "view.html", data)
}

async fn snippet_create(
    State(state): State<AppState>,
    mut data: TemplateData,
) -> Result<Response, HttpError> {
    let form = SnippetCreateForm {
        expires: String::from("365"),
        ..SnippetCreateForm::default()
    };
    data.insert("form", &form);
    state.templates.render(StatusCode::OK, "create.html", data)
}

async fn snippet_create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut data: TemplateData,
    form: Result<Form<SnippetCreateForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let Ok(Form(mut form)) = form else {
        return Err(HttpError::client_error(StatusCode::BAD_REQUEST));
    };
    let Ok(expires) = form.expires.parse::<i32>() else {
        return Err(HttpError::client_error(StatusCode::BAD_REQUEST));
    };

    form.validator
        .check_field(not_blank(&form.title), "title", "This field cannot be blank");
    form.validator.check_field(
        max_chars(&form.title, TITLE_MAX_CHARS),
        "title",
        "This field cannot be more than 100 characters long",
    );
    form.validator
        .check_field(not_blank(&form.content), "content", "This field cannot be blank");
    form.validator.check_field(
        permitted(&expires, &PERMITTED_EXPIRES),
        "expires",
        "This field must equal 1, 7 or 365",
    );
    if !form.validator.valid() {
        data.insert("form", &form);
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create.html", data);
    }

    let id = state
        .snippets
        .insert(SnippetInsert::new(&form.title, &form.content, expires))
        .await?;
    session.put(FLASH, "Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

impl From<SnippetError> for HttpError {
    fn from(err: SnippetError) -> Self {
        match err {
            SnippetError::NoRecord(_) => Self::not_found(),
            SnippetError::DatabaseError(err) => err.into(),
        }
    }
}
