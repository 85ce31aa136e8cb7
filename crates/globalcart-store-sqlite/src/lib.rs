//! SQLite backend for GlobalCart's durable client-side storage.
//!
//! A single key-value table holds the session id, the signed-in customer, the
//! cart and the admin key, each as a JSON string. Access is synchronous
//! behind a mutex; every operation is a single indexed statement.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{Entry, SqliteStore};

#[cfg(test)]
mod tests;
