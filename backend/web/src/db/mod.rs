//! Contains database models and interaction code.
pub mod models;
use crate::constants::db as constants;

/// An alias for the underlying DBMS specific pool type.
pub type ConnectionPool = sqlx::PgPool;

/// Initiate a pooled connection to the database.
pub async fn connect() -> Result<ConnectionPool, errors::DatabaseError> {
    Ok(sqlx::PgPool::connect(&constants::DB_URL).await?)
}

pub mod errors {
    use thiserror::Error;

    /// An error raised by the database or its connection pool.
    #[derive(Error, Debug)]
    #[error(transparent)]
    pub struct DatabaseError(#[from] sqlx::Error);

    impl DatabaseError {
        /// Whether this error is a violation of a UNIQUE constraint.
        pub fn is_unique_violation(&self) -> bool {
            self.0
                .as_database_error()
                .is_some_and(|err| err.is_unique_violation())
        }
    }
}
