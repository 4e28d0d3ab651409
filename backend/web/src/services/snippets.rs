//! Storage capability for snippets, with the PostgreSQL implementation used in
//! production.
use crate::{
    constants::api::LATEST_SNIPPETS_LIMIT,
    db::{
        models::snippet::{Snippet, SnippetInsert},
        ConnectionPool,
    },
};
use async_trait::async_trait;

/// Anything able to store and retrieve snippets.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Store a new snippet and return its ID.
    async fn insert(&self, snippet: SnippetInsert) -> Result<i64, errors::SnippetError>;
    /// Fetch one snippet. Expired and unknown snippets are `NoRecord`.
    async fn get(&self, id: i64) -> Result<Snippet, errors::SnippetError>;
    /// The most recent unexpired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, errors::SnippetError>;
}

/// Snippets kept in the PostgreSQL `snippets` table.
#[derive(Clone)]
pub struct PgSnippetStore(ConnectionPool);

impl PgSnippetStore {
    pub const fn new(db_client: ConnectionPool) -> Self {
        Self(db_client)
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn insert(&self, snippet: SnippetInsert) -> Result<i64, errors::SnippetError> {
        Ok(snippet.store(&self.0).await?)
    }

    async fn get(&self, id: i64) -> Result<Snippet, errors::SnippetError> {
        Snippet::select_one(id, &self.0)
            .await?
            .ok_or(errors::SnippetError::NoRecord(id))
    }

    async fn latest(&self) -> Result<Vec<Snippet>, errors::SnippetError> {
        Ok(Snippet::select_latest(LATEST_SNIPPETS_LIMIT, &self.0).await?)
    }
}

pub mod errors {
    use crate::db::errors::DatabaseError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SnippetError {
        /// No unexpired snippet has this ID.
        #[error("no matching snippet found for id {0}")]
        NoRecord(i64),
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
    }
}
