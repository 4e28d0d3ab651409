//! Pages for signing up, logging in and logging out.
use crate::{
    constants::{
        passwords::{PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH},
        sessions::{AUTHENTICATED_USER_ID, FLASH},
    },
    middleware::Chain,
    services::{
        sessions::Session,
        users::errors::{AuthenticateError, UserInsertError},
    },
    state::AppState,
    templates::TemplateData,
    utils::{
        email::{EmailAddress, EMAIL_REGEX},
        httperror::HttpError,
        validator::{matches, max_chars, min_chars, not_blank, Validator},
    },
};
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse as _, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::{Deserialize, Serialize};

/// Create a router for the account pages. Logging out requires a login.
pub fn create_router(dynamic: &Chain, protected: &Chain) -> Router<AppState> {
    Router::new()
        .route(
            "/user/signup",
            dynamic.then(get(user_signup).post(user_signup_post)),
        )
        .route(
            "/user/login",
            dynamic.then(get(user_login).post(user_login_post)),
        )
        .route("/user/logout", protected.then(post(user_logout_post)))
}

#[derive(Serialize, Deserialize, Default)]
pub struct UserSignupForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    /// Never echoed back to the page.
    #[serde(default, skip_serializing)]
    password: String,
    #[serde(skip_deserializing)]
    validator: Validator,
}

#[derive(Serialize, Deserialize, Default)]
pub struct UserLoginForm {
    #[serde(default)]
    email: String,
    #[serde(default, skip_serializing)]
    password: String,
    #[serde(skip_deserializing)]
    validator: Validator,
}

impl UserSignupForm {
    /// Run the field checks, returning the parsed email address if they pass.
    fn validate(&mut self) -> Option<EmailAddress> {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        let email = EmailAddress::try_from(self.email.as_str()).ok();
        v.check_field(
            email.is_some(),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v.check_field(
            min_chars(&self.password, PASSWORD_MIN_LENGTH),
            "password",
            "This field must be at least 8 characters long",
        );
        v.check_field(
            max_chars(&self.password, PASSWORD_MAX_LENGTH),
            "password",
            "This field must be at most 128 characters long",
        );
        email.filter(|_| v.valid())
    }
}

impl UserLoginForm {
    fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            matches(&self.email, &EMAIL_REGEX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v.valid()
    }
}

async fn user_signup(
    State(state): State<AppState>,
    mut data: TemplateData,
) -> Result<Response, HttpError> {
    data.insert("form", &UserSignupForm::default());
    state.templates.render(StatusCode::OK, "signup.html", data)
}

async fn user_signup_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut data: TemplateData,
    form: Result<Form<UserSignupForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let Ok(Form(mut form)) = form else {
        return Err(HttpError::client_error(StatusCode::BAD_REQUEST));
    };
    let Some(email) = form.validate() else {
        data.insert("form", &form);
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", data);
    };

    match state.users.insert(&form.name, email, &form.password).await {
        Ok(_) => {}
        Err(UserInsertError::DuplicateEmail) => {
            form.validator
                .add_field_error("email", "Email address is already in use");
            data.insert("form", &form);
            return state
                .templates
                .render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", data);
        }
        Err(err) => return Err(HttpError::server_error(&err)),
    }

    session.put(FLASH, "Your signup was successful. Please log in.");
    Ok(Redirect::to("/user/login").into_response())
}

async fn user_login(
    State(state): State<AppState>,
    mut data: TemplateData,
) -> Result<Response, HttpError> {
    data.insert("form", &UserLoginForm::default());
    state.templates.render(StatusCode::OK, "login.html", data)
}

async fn user_login_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut data: TemplateData,
    form: Result<Form<UserLoginForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let Ok(Form(mut form)) = form else {
        return Err(HttpError::client_error(StatusCode::BAD_REQUEST));
    };
    if !form.validate() {
        data.insert("form", &form);
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", data);
    }

    let id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(AuthenticateError::InvalidCredentials) => {
            form.validator
                .add_non_field_error("Email or password is incorrect");
            data.insert("form", &form);
            return state
                .templates
                .render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", data);
        }
        Err(AuthenticateError::DatabaseError(err)) => return Err(err.into()),
    };

    // Privilege change: move to a fresh token before recording the login.
    session.renew_token();
    session.put(AUTHENTICATED_USER_ID, id);
    Ok(Redirect::to("/snippet/create").into_response())
}

async fn user_logout_post(Extension(session): Extension<Session>) -> Response {
    session.renew_token();
    session.remove(AUTHENTICATED_USER_ID);
    session.put(FLASH, "You've been logged out successfully!");
    Redirect::to("/").into_response()
}
