//! Defines data models (structs) which map directly to rows in the database.
pub mod appuser;
pub mod password;
pub mod snippet;
