//! Models mapping to the snippets database table. Represents a piece of text
//! shared by a user for a limited period of time.
use crate::db::{errors::DatabaseError, ConnectionPool};
use serde::Serialize;
use sqlx::{query_as, query_scalar};
use time::{macros::format_description, OffsetDateTime};

/// INSERT model for a `Snippet`. Used ONLY when creating a new snippet.
pub struct SnippetInsert {
    /// The title of the snippet.
    pub title: String,
    /// The body of the snippet.
    pub content: String,
    /// Number of days until the snippet expires.
    expires_days: i32,
}

/// A `Snippet` which is stored in the database. Can only be constructed by
/// reading it from the database (or from an in-memory store).
#[derive(sqlx::FromRow, Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    /// The snippet's ID primary key.
    pub id: i64,
    /// The title of the snippet.
    pub title: String,
    /// The body of the snippet.
    pub content: String,
    /// When the snippet was created.
    pub created: OffsetDateTime,
    /// When the snippet stops being visible.
    pub expires: OffsetDateTime,
}

/// A snippet as presented to templates, with human readable timestamps.
#[derive(Serialize, Debug, Clone)]
pub struct SnippetView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: String,
    pub expires: String,
}

impl SnippetInsert {
    /// Construct a new snippet INSERT model.
    pub fn new(title: &str, content: &str, expires_days: i32) -> Self {
        Self {
            title: title.to_owned(),
            content: content.to_owned(),
            expires_days,
        }
    }
    /// Get the number of days until the snippet expires.
    pub const fn expires_days(&self) -> i32 {
        self.expires_days
    }
    /// Store this INSERT model in the database and return the new snippet's ID.
    pub async fn store(self, db_client: &ConnectionPool) -> Result<i64, DatabaseError> {
        Ok(query_scalar(
            "INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id",
        )
        .bind(self.title)
        .bind(self.content)
        .bind(self.expires_days)
        .fetch_one(db_client)
        .await?)
    }
}

impl Snippet {
    /// Select an unexpired `Snippet` from the database by its ID.
    pub async fn select_one(
        id: i64,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as(
            "SELECT id, title, content, created, expires FROM snippets
            WHERE expires > NOW() AND id = $1",
        )
        .bind(id)
        .fetch_optional(db_client)
        .await?)
    }
    /// Select the most recently created unexpired snippets.
    pub async fn select_latest(
        limit: usize,
        db_client: &ConnectionPool,
    ) -> Result<Vec<Self>, DatabaseError> {
        Ok(query_as(
            "SELECT id, title, content, created, expires FROM snippets
            WHERE expires > NOW() ORDER BY id DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(db_client)
        .await?)
    }
    /// Whether the snippet has passed its expiry time.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires <= now
    }
}

/// Render a timestamp the way pages show it, e.g. `02 Jan 2024 at 15:04`.
fn human_date(timestamp: OffsetDateTime) -> String {
    let format = format_description!("[day] [month repr:short] [year] at [hour]:[minute]");
    timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}

impl From<&Snippet> for SnippetView {
    fn from(snippet: &Snippet) -> Self {
        Self {
            id: snippet.id,
            title: snippet.title.clone(),
            content: snippet.content.clone(),
            created: human_date(snippet.created),
            expires: human_date(snippet.expires),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn human_date_uses_utc() {
        assert_eq!(
            human_date(datetime!(2024-03-17 10:15 +02:00)),
            "17 Mar 2024 at 08:15"
        );
    }

    #[test]
    fn expiry_is_inclusive_of_deadline() {
        let now = datetime!(2024-03-17 10:15 UTC);
        let snippet = Snippet {
            id: 1,
            title: String::from("t"),
            content: String::from("c"),
            created: now,
            expires: now,
        };
        assert!(snippet.is_expired(now));
    }
}
