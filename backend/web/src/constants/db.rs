use super::secrets::read_secret;
use std::{env::var, sync::LazyLock};

pub static DB_HOST: LazyLock<String> =
    LazyLock::new(|| var("DB_HOST").expect("DB_HOST not provided in environment variables"));

pub static DB_USERNAME: LazyLock<String> = LazyLock::new(|| {
    var("DB_USERNAME").expect("DB_USERNAME not provided in environment variables")
});

pub static DB_DATABASE: LazyLock<String> = LazyLock::new(|| {
    var("DB_DATABASE").unwrap_or_else(|_| String::from("snippetbox"))
});

pub static DB_PASSWORD: LazyLock<String> = LazyLock::new(|| {
    var("DB_PASSWORD").unwrap_or_else(|_| {
        let secret_path = var("DB_PASSWORD_DOCKER_SECRET").expect(
            "Neither DB_PASSWORD nor DB_PASSWORD_DOCKER_SECRET provided in environment variables",
        );
        read_secret(&secret_path).expect("Failed to read DB_PASSWORD docker secret")
    })
});

/// The full connection string for the snippet/user database.
pub static DB_URL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "postgres://{}:{}@{}/{}",
        *DB_USERNAME, *DB_PASSWORD, *DB_HOST, *DB_DATABASE
    )
});
