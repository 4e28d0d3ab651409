//! Constants for form handling and the anti-forgery check.

/// Name of the hidden form field carrying the CSRF token.
pub const CSRF_FIELD: &str = "csrf_token";
/// Header that may carry the CSRF token instead of the form field.
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Largest form body buffered while looking for the CSRF token. Matches the
/// limit the `Form` extractor applies afterwards.
pub const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;
/// Longest permitted snippet title, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Expiry periods (in days) a snippet may be created with.
pub const PERMITTED_EXPIRES: [i32; 3] = [1, 7, 365];
