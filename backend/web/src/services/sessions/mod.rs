//! Logic for session handling. Creating, mutating and revoking sessions.
//!
//! A `Session` is a cheap handle onto request-local session state. The session
//! middleware creates one per request, handlers mutate it freely, and the
//! buffered changes are written back to the store exactly once on the way out.
use crate::constants::sessions::{SESSION_LIFETIME, TOKEN_BYTES};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
pub mod store;
use store::SessionRecord;

pub use store::errors;

/// Generates a new random token using a CSPRNG, encoded as URL-safe base64.
pub fn generate_token() -> String {
    let mut token_buf: [u8; TOKEN_BYTES] = [0; TOKEN_BYTES];
    getrandom::fill(&mut token_buf).expect("Error getting OS random. Critical, aborting.");
    URL_SAFE_NO_PAD.encode(token_buf)
}

/// What has happened to a session during the current request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been written.
    Unmodified,
    /// At least one value or the token has changed.
    Modified,
    /// The session was destroyed and must be removed from the store.
    Destroyed,
}

struct SessionState {
    /// The token this session is persisted under. `None` until first saved.
    token: Option<String>,
    /// A token replaced by `renew_token` whose record must be destroyed.
    previous_token: Option<String>,
    record: SessionRecord,
    status: Status,
}

/// A handle onto the session of the request being processed. Clones share the
/// same underlying state.
#[derive(Clone)]
pub struct Session(Arc<Mutex<SessionState>>);

/// Instructions for the session middleware once the handler has returned.
#[derive(Debug, PartialEq)]
pub struct Commit {
    /// Token to persist `record` under, and to hand to the client.
    pub token: String,
    /// Record to persist, or `None` if the session was destroyed.
    pub record: Option<SessionRecord>,
    /// A stale token to destroy in the store before saving.
    pub stale_token: Option<String>,
}

impl Session {
    /// Start a brand new, empty session. No token is assigned until it is saved.
    pub fn new() -> Self {
        Self::from_state(None, SessionRecord::new(time::Duration::seconds(SESSION_LIFETIME)))
    }

    /// Wrap a record previously loaded from the store under `token`.
    pub fn loaded(token: String, record: SessionRecord) -> Self {
        Self::from_state(Some(token), record)
    }

    fn from_state(token: Option<String>, record: SessionRecord) -> Self {
        Self(Arc::new(Mutex::new(SessionState {
            token,
            previous_token: None,
            record,
            status: Status::Unmodified,
        })))
    }

    /// Read a value, deserializing it into the requested type. Values of the
    /// wrong type read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.0.lock();
        let value = state.record.values.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    /// Store a value, replacing whatever was held under `key`.
    pub fn put(&self, key: &str, value: impl Into<Value>) {
        let mut state = self.0.lock();
        state.record.values.insert(key.to_owned(), value.into());
        state.mark_modified();
    }

    /// Read and remove a value in one step. Used for one-shot data like flash
    /// messages.
    pub fn pop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut state = self.0.lock();
        let value = state.record.values.remove(key)?;
        state.mark_modified();
        serde_json::from_value(value).ok()
    }

    pub fn remove(&self, key: &str) {
        let mut state = self.0.lock();
        if state.record.values.remove(key).is_some() {
            state.mark_modified();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.lock().record.values.contains_key(key)
    }

    /// Move the session to a fresh token, keeping its data. Must be called on
    /// every privilege change (login, logout) to prevent session fixation.
    pub fn renew_token(&self) {
        let mut state = self.0.lock();
        let old = state.token.replace(generate_token());
        if state.previous_token.is_none() {
            state.previous_token = old;
        }
        state.status = Status::Modified;
    }

    /// Throw away all data and remove the session from the store at the end of
    /// the request.
    pub fn destroy(&self) {
        let mut state = self.0.lock();
        state.record.values.clear();
        state.status = Status::Destroyed;
    }

    /// The token the session is (or will be) stored under, if one is assigned.
    pub fn token(&self) -> Option<String> {
        self.0.lock().token.clone()
    }

    pub fn status(&self) -> Status {
        self.0.lock().status
    }

    /// Seconds left until the session expires.
    pub fn remaining_seconds(&self) -> u64 {
        self.0.lock().record.remaining_seconds().unwrap_or(0)
    }

    /// Settle the request's changes into a single write. A new session gets
    /// its token assigned here.
    pub fn commit(&self) -> Commit {
        let mut state = self.0.lock();
        let token = state.token.get_or_insert_with(generate_token).clone();
        let stale_token = state.previous_token.take();
        let record = (state.status != Status::Destroyed).then(|| state.record.clone());
        state.status = Status::Unmodified;
        Commit {
            token,
            record,
            stale_token,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    fn mark_modified(&mut self) {
        if self.status == Status::Unmodified {
            self.status = Status::Modified;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn pop_consumes_value_once() {
        let session = Session::new();
        session.put("flash", "Saved!");
        assert_eq!(session.pop::<String>("flash").as_deref(), Some("Saved!"));
        assert_eq!(session.pop::<String>("flash"), None);
        assert!(!session.contains("flash"));
    }

    #[test]
    fn get_with_wrong_type_is_none() {
        let session = Session::new();
        session.put("authenticatedUserID", "not a number");
        assert_eq!(session.get::<i64>("authenticatedUserID"), None);
    }

    #[test]
    fn reading_does_not_modify() {
        let session = Session::loaded(generate_token(), SessionRecord::new(time::Duration::hours(1)));
        let _: Option<i64> = session.get("authenticatedUserID");
        session.remove("missing");
        assert_eq!(session.status(), Status::Unmodified);
    }

    #[test]
    fn new_session_gets_token_on_commit() {
        let session = Session::new();
        assert_eq!(session.token(), None);
        let commit = session.commit();
        assert!(commit.record.is_some());
        assert_eq!(commit.stale_token, None);
        assert_eq!(session.token(), Some(commit.token));
    }

    #[test]
    fn renewed_token_destroys_the_original() {
        let original = generate_token();
        let session = Session::loaded(original.clone(), SessionRecord::new(time::Duration::hours(1)));
        session.put("authenticatedUserID", 7_i64);
        session.renew_token();
        session.renew_token();
        let commit = session.commit();
        assert_ne!(commit.token, original);
        assert_eq!(commit.stale_token, Some(original));
        let record = commit.record.expect("record kept");
        assert_eq!(record.values.get("authenticatedUserID"), Some(&Value::from(7_i64)));
    }

    #[test]
    fn destroyed_session_commits_no_record() {
        let session = Session::loaded(generate_token(), SessionRecord::new(time::Duration::hours(1)));
        session.put("flash", "bye");
        session.destroy();
        assert_eq!(session.status(), Status::Destroyed);
        assert_eq!(session.commit().record, None);
    }
}
