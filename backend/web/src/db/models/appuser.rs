//! Models mapping to the users database table. Represents an account which
//! can log in and create snippets.
use crate::{
    db::{errors::DatabaseError, ConnectionPool},
    utils::email::EmailAddress,
};
use sqlx::{query_as, query_scalar};

/// INSERT model for an `AppUser`. Used ONLY when creating a new user.
pub struct AppUserInsert {
    /// The user's display name.
    pub name: String,
    /// The user's email address. Private to enforce validity.
    email: EmailAddress,
    /// The Argon2id PHC string of the user's password.
    hashed_password: String,
}

/// The subset of a user row needed to check a login attempt.
#[derive(sqlx::FromRow)]
pub struct AppUserCredentials {
    /// The user's ID primary key.
    pub id: i64,
    /// The Argon2id PHC string of the user's password.
    pub hashed_password: String,
}

impl AppUserInsert {
    /// Construct a new `AppUser` INSERT model from an already hashed password.
    pub fn new(name: &str, email: EmailAddress, hashed_password: String) -> Self {
        Self {
            name: name.to_owned(),
            email,
            hashed_password,
        }
    }

    /// Store this INSERT model in the database and return the new user's ID.
    /// Fails with a unique violation if the email address is already taken.
    pub async fn store(self, db_client: &ConnectionPool) -> Result<i64, DatabaseError> {
        Ok(query_scalar(
            "INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, NOW()) RETURNING id",
        )
        .bind(self.name)
        .bind(String::from(self.email))
        .bind(self.hashed_password)
        .fetch_one(db_client)
        .await?)
    }
}

impl AppUserCredentials {
    /// Select the credentials of the user registered under an email address.
    pub async fn select_by_email(
        email: &str,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(
            query_as("SELECT id, hashed_password FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(db_client)
                .await?,
        )
    }
}

/// Check whether a user with the given ID still exists.
pub async fn exists(id: i64, db_client: &ConnectionPool) -> Result<bool, DatabaseError> {
    Ok(
        query_scalar("SELECT EXISTS(SELECT true FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(db_client)
            .await?,
    )
}
