//! Customer authentication and the email outbox.
//!
//! Every successful sign-in overwrites the stored customer. The admin key is
//! kept under its own storage key and is never touched here.

use globalcart_core::{
  model::{Customer, CustomerId, OrderId},
  validate,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{ApiClient, RequestOptions, Result};

const AUTH: &str = "/api/auth";

/// Identity returned by every sign-in flavour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthOutcome {
  pub email:        String,
  pub customer_id:  CustomerId,
  #[serde(default)]
  pub geo_id:       Option<i64>,
  #[serde(default)]
  pub display_name: Option<String>,
}

impl From<AuthOutcome> for Customer {
  fn from(a: AuthOutcome) -> Self {
    Customer { customer_id: a.customer_id, email: a.email, display_name: a.display_name }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OtpSent {
  pub email:              String,
  pub otp_sent:           bool,
  pub expires_in_seconds: u64,
  /// Only populated by demo deployments.
  #[serde(default)]
  pub demo_otp:           Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct EmailExists {
  exists: bool,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
  display_name: &'a str,
  email:        &'a str,
  password:     &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutboxEmail {
  pub email_id:   i64,
  pub to_email:   String,
  pub subject:    String,
  pub body:       String,
  pub kind:       String,
  #[serde(default)]
  pub order_id:   Option<OrderId>,
  pub status:     String,
  pub created_at: String,
  #[serde(default)]
  pub sent_at:    Option<String>,
}

impl ApiClient {
  fn remember(&self, outcome: AuthOutcome) -> Customer {
    let customer = Customer::from(outcome);
    self.persistence().set_customer(Some(&customer));
    info!(customer_id = customer.customer_id, "signed in");
    customer
  }

  /// Demo sign-in by email only.
  pub async fn resolve(&self, email: &str) -> Result<Customer> {
    let email = validate::email(email)?;
    let out = self
      .post("/api/customer/customers/resolve", &json!({ "email": email }), RequestOptions::new())
      .await?;
    Ok(self.remember(out))
  }

  pub async fn request_otp(&self, email: &str) -> Result<OtpSent> {
    let email = validate::email(email)?;
    self
      .post(&format!("{AUTH}/request-otp"), &json!({ "email": email }), RequestOptions::new())
      .await
  }

  pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Customer> {
    let email = validate::email(email)?;
    let otp = validate::otp(otp)?;
    let out = self
      .post(
        &format!("{AUTH}/verify-otp"),
        &json!({ "email": email, "otp": otp }),
        RequestOptions::new(),
      )
      .await?;
    Ok(self.remember(out))
  }

  /// Start a signup. The password must satisfy the signup rules and match
  /// `confirm`; both are checked before any request is made.
  pub async fn signup_request_otp(
    &self,
    display_name: &str,
    email: &str,
    password: &str,
    confirm: &str,
  ) -> Result<OtpSent> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
      return Err(
        globalcart_core::Error::validation(
          globalcart_core::error::Field::DisplayName,
          globalcart_core::error::Rule::Required,
        )
        .into(),
      );
    }
    let email = validate::email(email)?;
    validate::new_password(password, confirm)?;
    let body = SignupRequest { display_name, email: &email, password };
    self.post(&format!("{AUTH}/signup/request-otp"), &body, RequestOptions::new()).await
  }

  pub async fn signup_verify_otp(&self, email: &str, otp: &str) -> Result<Customer> {
    let email = validate::email(email)?;
    let otp = validate::otp(otp)?;
    let out = self
      .post(
        &format!("{AUTH}/signup/verify-otp"),
        &json!({ "email": email, "otp": otp }),
        RequestOptions::new(),
      )
      .await?;
    Ok(self.remember(out))
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<Customer> {
    let email = validate::email(email)?;
    if password.is_empty() {
      return Err(
        globalcart_core::Error::validation(
          globalcart_core::error::Field::Password,
          globalcart_core::error::Rule::Required,
        )
        .into(),
      );
    }
    let out = self
      .post(
        &format!("{AUTH}/login"),
        &json!({ "email": email, "password": password }),
        RequestOptions::new(),
      )
      .await?;
    Ok(self.remember(out))
  }

  pub async fn email_exists(&self, email: &str) -> Result<bool> {
    let email = validate::email(email)?;
    let out: EmailExists = self
      .get(&format!("{AUTH}/email-exists"), RequestOptions::new().query("email", email))
      .await?;
    Ok(out.exists)
  }

  /// Forget the signed-in customer. The cart and admin key are kept.
  pub fn sign_out(&self) { self.persistence().set_customer(None); }

  /// Transactional emails sent to the customer, newest first.
  pub async fn emails(&self, customer_id: CustomerId, limit: u32) -> Result<Vec<OutboxEmail>> {
    let opts = RequestOptions::new().query("customer_id", customer_id).query("limit", limit);
    self.get("/api/customer/emails", opts).await
  }
}
