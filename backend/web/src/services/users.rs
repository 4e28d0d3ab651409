//! Storage capability for user accounts: signing up, checking credentials and
//! confirming an account still exists.
use crate::{
    db::{
        errors::DatabaseError,
        models::{
            appuser::{self, AppUserCredentials, AppUserInsert},
            password,
        },
        ConnectionPool,
    },
    utils::email::EmailAddress,
};
use async_trait::async_trait;

/// Anything able to manage user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account and return its ID. The password is hashed here.
    async fn insert(
        &self,
        name: &str,
        email: EmailAddress,
        password: &str,
    ) -> Result<i64, errors::UserInsertError>;
    /// Check a login attempt, returning the matching user's ID.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<i64, errors::AuthenticateError>;
    /// Whether an account with this ID currently exists.
    async fn exists(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Accounts kept in the PostgreSQL `users` table.
#[derive(Clone)]
pub struct PgUserStore(ConnectionPool);

impl PgUserStore {
    pub const fn new(db_client: ConnectionPool) -> Self {
        Self(db_client)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        name: &str,
        email: EmailAddress,
        password: &str,
    ) -> Result<i64, errors::UserInsertError> {
        let hashed_password = password::hash_password(password)?;
        let user = AppUserInsert::new(name, email, hashed_password);
        Ok(user.store(&self.0).await?)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<i64, errors::AuthenticateError> {
        let credentials = AppUserCredentials::select_by_email(email, &self.0)
            .await?
            .ok_or(errors::AuthenticateError::InvalidCredentials)?;
        if password::verify_password(password, &credentials.hashed_password) {
            Ok(credentials.id)
        } else {
            Err(errors::AuthenticateError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        appuser::exists(id, &self.0).await
    }
}

pub mod errors {
    use crate::db::{errors::DatabaseError, models::password::errors::PasswordError};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum UserInsertError {
        /// Another account already uses this email address.
        #[error("email address is already in use")]
        DuplicateEmail,
        #[error(transparent)]
        PasswordError(#[from] PasswordError),
        #[error(transparent)]
        DatabaseError(DatabaseError),
    }

    impl From<DatabaseError> for UserInsertError {
        fn from(err: DatabaseError) -> Self {
            if err.is_unique_violation() {
                Self::DuplicateEmail
            } else {
                Self::DatabaseError(err)
            }
        }
    }

    #[derive(Error, Debug)]
    pub enum AuthenticateError {
        /// Unknown email or wrong password. Deliberately not told apart.
        #[error("invalid credentials")]
        InvalidCredentials,
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
    }
}
