//! Small shared helpers: errors rendered as HTTP responses, and form validation.
pub mod email;
pub mod httperror;
pub mod validator;
