//! Wire and domain types shared by every GlobalCart crate.
//!
//! Everything the server owns (products, orders, timelines) is a read-only
//! projection here. The only client-owned records are the customer snapshot,
//! the cart, and the checkout draft.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub type CustomerId = i64;
pub type ProductId = i64;
pub type OrderId = i64;
pub type AddressId = i64;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The signed-in shopper. Absence of a stored customer means "guest".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
  pub customer_id:  CustomerId,
  pub email:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
}

impl Customer {
  /// Name shown in the navigation: display name, else a masked email.
  pub fn label(&self) -> String {
    if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
      return format!("{name} (#{})", self.customer_id);
    }
    let masked = match self.email.split_once('@') {
      Some((local, domain)) => {
        let head: String = local.chars().take(3).collect();
        format!("{head}***@{domain}")
      }
      None => self.email.clone(),
    };
    format!("{masked} (#{})", self.customer_id)
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub product_id:   ProductId,
  pub sku:          String,
  pub product_name: String,
  #[serde(default)]
  pub category_l1:  String,
  #[serde(default)]
  pub category_l2:  String,
  #[serde(default)]
  pub brand:        String,
  pub list_price:   Decimal,
  #[serde(default)]
  pub discount_pct: i32,
  pub sell_price:   Decimal,
  #[serde(default)]
  pub image_url:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
  #[serde(flatten)]
  pub product:     Product,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_true")]
  pub in_stock:    bool,
  #[serde(default)]
  pub stock_qty:   i64,
}

fn default_true() -> bool { true }

// ─── Cart ────────────────────────────────────────────────────────────────────

/// One cart line. The cart engine keeps `product_id` unique and `qty` in
/// `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: ProductId,
  pub qty:        u32,
}

// ─── Addresses ───────────────────────────────────────────────────────────────

/// Shipping address as typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub recipient_name: String,
  pub phone:          String,
  pub address_line1:  String,
  #[serde(default)]
  pub address_line2:  String,
  pub city:           String,
  pub state:          String,
  pub postal_code:    String,
  pub country:        String,
}

impl Address {
  pub const DEFAULT_COUNTRY: &'static str = "India";

  /// An empty form with the storefront's default country filled in.
  pub fn blank() -> Self {
    Self { country: Self::DEFAULT_COUNTRY.to_owned(), ..Self::default() }
  }

  /// Copy with every field trimmed, as the form submits it.
  pub fn trimmed(&self) -> Self {
    Self {
      recipient_name: self.recipient_name.trim().to_owned(),
      phone:          self.phone.trim().to_owned(),
      address_line1:  self.address_line1.trim().to_owned(),
      address_line2:  self.address_line2.trim().to_owned(),
      city:           self.city.trim().to_owned(),
      state:          self.state.trim().to_owned(),
      postal_code:    self.postal_code.trim().to_owned(),
      country:        self.country.trim().to_owned(),
    }
  }
}

/// An address previously saved to the customer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
  pub address_id:     AddressId,
  #[serde(default)]
  pub label:          Option<String>,
  pub recipient_name: String,
  pub phone:          String,
  pub address_line1:  String,
  #[serde(default)]
  pub address_line2:  Option<String>,
  pub city:           String,
  pub state:          String,
  pub postal_code:    String,
  pub country:        String,
  #[serde(default)]
  pub is_default:     bool,
}

impl SavedAddress {
  pub fn to_address(&self) -> Address {
    Address {
      recipient_name: self.recipient_name.clone(),
      phone:          self.phone.clone(),
      address_line1:  self.address_line1.clone(),
      address_line2:  self.address_line2.clone().unwrap_or_default(),
      city:           self.city.clone(),
      state:          self.state.clone(),
      postal_code:    self.postal_code.clone(),
      country:        self.country.clone(),
    }
  }

  /// One-line summary used in address pickers.
  pub fn summary(&self) -> String {
    let prefix = self
      .label
      .as_deref()
      .filter(|l| !l.is_empty())
      .map(|l| format!("{l} · "))
      .unwrap_or_default();
    let mut out = format!(
      "{prefix}{}, {}, {}, {} {}",
      self.recipient_name, self.address_line1, self.city, self.state, self.postal_code
    );
    if self.is_default {
      out.push_str(" (Default)");
    }
    out
  }
}

/// Body for creating or updating a saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label:      Option<String>,
  #[serde(flatten)]
  pub address:    Address,
  pub is_default: bool,
}

// ─── Orders ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PaymentMethod {
  #[default]
  Upi,
  Card,
  Netbanking,
  Cod,
}

/// Known order statuses. The server may add more; unknown values stay
/// strings on the projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderStatus {
  Placed,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id:   ProductId,
  pub product_name: String,
  pub qty:          u32,
}

/// One row of a customer's order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
  pub order_id:     OrderId,
  pub order_ts:     String,
  pub order_status: String,
  pub net_amount:   Decimal,
  #[serde(default)]
  pub items:        Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersByCustomer {
  pub customer_id: CustomerId,
  #[serde(default)]
  pub orders:      Vec<OrderSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
  pub order_id:              OrderId,
  pub customer_id:           CustomerId,
  pub order_ts:              String,
  pub order_status:          String,
  #[serde(default)]
  pub payment_status:        Option<String>,
  pub net_amount:            Decimal,
  pub gross_amount:          Decimal,
  pub discount_amount:       Decimal,
  pub tax_amount:            Decimal,
  #[serde(default)]
  pub promo_code:            Option<String>,
  #[serde(default)]
  pub promo_discount_amount: Option<Decimal>,
  #[serde(default)]
  pub items:                 Vec<OrderItem>,
}

/// `POST /orders` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
  pub items:                    Vec<CartLine>,
  pub channel:                  String,
  pub currency:                 String,
  pub customer_id:              Option<CustomerId>,
  pub promo_code:               Option<String>,
  pub payment_method:           PaymentMethod,
  pub simulate_payment_failure: bool,
  pub failure_reason:           Option<String>,
  pub address:                  Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
  pub order_id:              OrderId,
  pub net_amount:            Decimal,
  #[serde(default)]
  pub order_status:          Option<String>,
  #[serde(default)]
  pub payment_status:        Option<String>,
  #[serde(default)]
  pub promo_code:            Option<String>,
  #[serde(default)]
  pub promo_discount_amount: Option<Decimal>,
}

impl OrderCreated {
  pub fn payment_failed(&self) -> bool {
    self
      .payment_status
      .as_deref()
      .is_some_and(|s| s.trim().eq_ignore_ascii_case("FAILED"))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
  pub customer_id: CustomerId,
  pub reason:      String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledOrder {
  pub order_id:     OrderId,
  pub order_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStage {
  pub stage:     String,
  pub timestamp: Option<String>,
}

/// Per-stage timestamps as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
  pub order_id:            OrderId,
  pub current_status:      String,
  #[serde(default)]
  pub stages:              Vec<TimelineStage>,
  #[serde(default)]
  pub cancellation_reason: Option<String>,
}

// ─── Promotions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoValidation {
  #[serde(default)]
  pub code:            Option<String>,
  pub valid:           bool,
  #[serde(default)]
  pub discount_amount: Option<Decimal>,
  #[serde(default)]
  pub message:         Option<String>,
}

/// A promo code the server accepted for the current checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromo {
  pub code:            String,
  pub discount_amount: Decimal,
}

// ─── Funnel analytics ────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FunnelStage {
  ViewProduct,
  AddToCart,
  ViewCart,
  CheckoutStarted,
  PaymentAttempted,
  PaymentFailed,
  OrderPlaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Device {
  #[default]
  Desktop,
  Mobile,
}

/// The stage-specific part of a funnel beacon; the session and customer are
/// filled in by whoever sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelStep {
  pub stage:          FunnelStage,
  pub product_id:     Option<ProductId>,
  pub order_id:       Option<OrderId>,
  pub failure_reason: Option<String>,
}

impl FunnelStep {
  pub fn new(stage: FunnelStage) -> Self {
    Self { stage, product_id: None, order_id: None, failure_reason: None }
  }

  pub fn with_order(mut self, order_id: OrderId) -> Self {
    self.order_id = Some(order_id);
    self
  }

  pub fn with_product(mut self, product_id: ProductId) -> Self {
    self.product_id = Some(product_id);
    self
  }

  pub fn with_failure_reason(mut self, reason: Option<String>) -> Self {
    self.failure_reason = reason;
    self
  }
}

/// `POST /api/events/funnel` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelEvent {
  pub session_id:     String,
  pub stage:          FunnelStage,
  pub channel:        String,
  pub device:         Device,
  pub customer_id:    Option<CustomerId>,
  pub product_id:     Option<ProductId>,
  pub order_id:       Option<OrderId>,
  pub failure_reason: Option<String>,
}
