//! In-process snippet and user stores with the same semantics as the
//! PostgreSQL ones. Used by the test suite and for running without a database.
use crate::{
    constants::api::LATEST_SNIPPETS_LIMIT,
    db::{
        errors::DatabaseError,
        models::{
            password,
            snippet::{Snippet, SnippetInsert},
        },
    },
    services::{
        snippets::{errors::SnippetError, SnippetStore},
        users::{
            errors::{AuthenticateError, UserInsertError},
            UserStore,
        },
    },
    utils::email::EmailAddress,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime};

#[derive(Default)]
pub struct MemorySnippetStore {
    snippets: Mutex<BTreeMap<i64, Snippet>>,
}

impl MemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snippets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn insert(&self, snippet: SnippetInsert) -> Result<i64, SnippetError> {
        let mut snippets = self.snippets.lock();
        let id = snippets.keys().next_back().map_or(1, |last| last + 1);
        let created = OffsetDateTime::now_utc();
        let expires = created + Duration::days(i64::from(snippet.expires_days()));
        snippets.insert(
            id,
            Snippet {
                id,
                title: snippet.title,
                content: snippet.content,
                created,
                expires,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        let now = OffsetDateTime::now_utc();
        self.snippets
            .lock()
            .get(&id)
            .filter(|snippet| !snippet.is_expired(now))
            .cloned()
            .ok_or(SnippetError::NoRecord(id))
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .snippets
            .lock()
            .values()
            .rev()
            .filter(|snippet| !snippet.is_expired(now))
            .take(LATEST_SNIPPETS_LIMIT)
            .cloned()
            .collect())
    }
}

struct MemoryUser {
    email: String,
    hashed_password: String,
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<i64, MemoryUser>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an account, as if it had been deleted while its sessions live on.
    pub fn delete(&self, id: i64) -> bool {
        self.users.lock().remove(&id).is_some()
    }

    /// Copy out the id and password hash registered for `email`.
    fn credentials(&self, email: &str) -> Option<(i64, String)> {
        self.users
            .lock()
            .iter()
            .find(|&(_, user)| user.email == email)
            .map(|(&id, user)| (id, user.hashed_password.clone()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(
        &self,
        _name: &str,
        email: EmailAddress,
        password: &str,
    ) -> Result<i64, UserInsertError> {
        let hashed_password = password::hash_password(password)?;
        let mut users = self.users.lock();
        if users.values().any(|user| user.email == email.as_str()) {
            return Err(UserInsertError::DuplicateEmail);
        }
        let id = users.keys().next_back().map_or(1, |last| last + 1);
        users.insert(
            id,
            MemoryUser {
                email: email.into(),
                hashed_password,
            },
        );
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, AuthenticateError> {
        // The lock is released before the slow hash comparison.
        self.credentials(email)
            .filter(|(_, hashed_password)| password::verify_password(password, hashed_password))
            .map(|(id, _)| id)
            .ok_or(AuthenticateError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.users.lock().contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_lists_newest_first_and_skips_expired() {
        let store = MemorySnippetStore::new();
        let first = store
            .insert(SnippetInsert::new("first", "a", 1))
            .await
            .expect("insert");
        let second = store
            .insert(SnippetInsert::new("second", "b", 7))
            .await
            .expect("insert");
        store.snippets.lock().entry(first).and_modify(|snippet| {
            snippet.expires = OffsetDateTime::now_utc() - Duration::seconds(1);
        });
        let latest = store.latest().await.expect("latest");
        assert_eq!(latest.iter().map(|s| s.id).collect::<Vec<_>>(), vec![second]);
        assert!(matches!(
            store.get(first).await,
            Err(SnippetError::NoRecord(id)) if id == first
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        let email = EmailAddress::try_from("bob@example.com").expect("email");
        store
            .insert("Bob", email.clone(), "pa55word!")
            .await
            .expect("first signup");
        assert!(matches!(
            store.insert("Bobby", email, "different1").await,
            Err(UserInsertError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let store = MemoryUserStore::new();
        let email = EmailAddress::try_from("alice@example.com").expect("email");
        let id = store
            .insert("Alice", email, "pa55word!")
            .await
            .expect("signup");
        assert_eq!(
            store
                .authenticate("alice@example.com", "pa55word!")
                .await
                .expect("login"),
            id
        );
        assert!(matches!(
            store.authenticate("alice@example.com", "wrong").await,
            Err(AuthenticateError::InvalidCredentials)
        ));
        assert!(store.delete(id));
        assert!(!store.exists(id).await.expect("exists"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn store_stays_usable_during_logins() {
        let store = std::sync::Arc::new(MemoryUserStore::new());
        let email = EmailAddress::try_from("alice@example.com").expect("email");
        let id = store
            .insert("Alice", email, "pa55word!")
            .await
            .expect("signup");
        let (found_id, hash) = store.credentials("alice@example.com").expect("credentials");
        assert_eq!(found_id, id);
        assert!(password::verify_password("pa55word!", &hash));
        assert!(store.credentials("bob@example.com").is_none());

        let logins: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.authenticate("alice@example.com", "pa55word!").await
                })
            })
            .collect();
        // Lookups are answered while the hashes are being checked.
        assert!(store.exists(id).await.expect("exists"));
        for login in logins {
            assert_eq!(login.await.expect("join").expect("login"), id);
        }
    }
}
