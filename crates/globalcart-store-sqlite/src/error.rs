//! Error type for `globalcart-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("could not create store directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for globalcart_core::Error {
  fn from(e: Error) -> Self { globalcart_core::Error::Storage(Box::new(e)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
