//! Error types for `globalcart-core`.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::model::OrderId;

/// A form field that failed client-side validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  RecipientName,
  Phone,
  AddressLine1,
  City,
  State,
  PostalCode,
  Country,
  SavedAddress,
  SaveAddress,
  CancellationReason,
  Email,
  Otp,
  DisplayName,
  Password,
  ConfirmPassword,
  Rating,
}

/// The rule a [`Field`] broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
  Required,
  TenDigits,
  SixDigits,
  Unknown,
  SignInRequired,
  TooWeak,
  Mismatch,
  OutOfRange,
}

/// A business rejection that is modeled rather than thrown by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Outcome {
  #[error("your cart is empty")]
  CartEmpty,

  #[error("sign in required")]
  SignInRequired,

  #[error("order cannot be cancelled while {status}")]
  NotCancellable { status: String },

  #[error("payment failed for order #{order_id}")]
  PaymentFailed { order_id: OrderId },
}

#[derive(Debug, Error)]
pub enum Error {
  /// The API host could not be contacted at all.
  #[error("{0}")]
  Unreachable(String),

  /// The API answered with a non-2xx status.
  #[error("{detail}")]
  Rejected { status: u16, detail: String },

  #[error("{field}: {rule}")]
  Validation { field: Field, rule: Rule },

  #[error(transparent)]
  BusinessOutcome(Outcome),

  #[error("cannot {action} while checkout is {state}")]
  InvalidTransition {
    action: &'static str,
    state:  &'static str,
  },

  #[error("an order submission is already in flight")]
  SubmissionInFlight,

  #[error("result belongs to a submission that is no longer in flight")]
  StaleSubmission,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(field: Field, rule: Rule) -> Self {
    Self::Validation { field, rule }
  }

  /// HTTP status for a rejected request, if any.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Rejected { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<Outcome> for Error {
  fn from(outcome: Outcome) -> Self { Self::BusinessOutcome(outcome) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
