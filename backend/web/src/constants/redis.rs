//! Redis connection related constants.
use std::env::var;
use std::sync::LazyLock;

/// The hostname where the Redis session store can be found.
pub static REDIS_HOST: LazyLock<String> = LazyLock::new(|| {
    var("REDIS_HOST").expect("REDIS_HOST not provided in environment variables")
});

/// The connection URL for the Redis session store.
pub static REDIS_URL: LazyLock<String> = LazyLock::new(|| format!("redis://{}/", *REDIS_HOST));

/// Prefix of every key holding session data.
pub const SESSION_KEY_PREFIX: &str = "sessions:";
