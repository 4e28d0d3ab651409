//! Constants related to session handling.

/// Lifetime of a session in seconds, counted from its creation.
pub const SESSION_LIFETIME: i64 = 12 * 60 * 60;
/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";
/// Whether the session cookie is restricted to HTTPS.
pub const SESSION_COOKIE_SECURE: bool = true;
/// Number of random bytes in a session or CSRF token.
pub const TOKEN_BYTES: usize = 32;

/// Session key holding the ID of the logged in user.
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
/// Session key holding the one-shot flash message.
pub const FLASH: &str = "flash";
/// Session key holding the anti-forgery token.
pub const CSRF_TOKEN: &str = "csrfToken";
