//! Password hashing used for the credential stored alongside each user.
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Instantiate an Argon2 context with the standard parameters.
fn create_argon2<'a>() -> Argon2<'a> {
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(12288, 3, 1, None).expect("Invalid Argon2id parameters"),
    )
}

/// Convert a raw password string into a hashed PHC string representation.
pub fn hash_password(password: &str) -> Result<String, errors::PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify that a given plaintext password matches a stored hash. A malformed
/// stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("Malformed Argon2id hash found in credential store");
        return false;
    };
    create_argon2()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub mod errors {
    use thiserror::Error;

    /// Hashing a new password failed.
    #[derive(Error, Debug)]
    #[error("failed to hash password: {0}")]
    pub struct PasswordError(String);

    impl From<argon2::password_hash::Error> for PasswordError {
        fn from(err: argon2::password_hash::Error) -> Self {
            Self(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
