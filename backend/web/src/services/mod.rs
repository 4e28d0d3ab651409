//! Services backing the pages: sessions, snippets and user accounts.
pub mod memory;
pub mod sessions;
pub mod snippets;
pub mod users;
