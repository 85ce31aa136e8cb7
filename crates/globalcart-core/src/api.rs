//! The `StorefrontApi` trait: the customer-facing calls the checkout and
//! order drivers make.
//!
//! Implemented over HTTP by `globalcart-client`. Tests substitute an
//! in-process fake.

use std::future::Future;

use rust_decimal::Decimal;

use crate::{
  error::Result,
  model::{
    CancelOrderRequest, CancelledOrder, CreateOrderRequest, CustomerId, FunnelStep, NewAddress,
    OrderCreated, OrderDetail, OrderId, OrdersByCustomer, ProductDetail, ProductId,
    PromoValidation, SavedAddress, Timeline,
  },
};

pub trait StorefrontApi: Send + Sync {
  // ── Catalog ───────────────────────────────────────────────────────────

  fn product(
    &self,
    product_id: ProductId,
  ) -> impl Future<Output = Result<ProductDetail>> + Send + '_;

  // ── Addresses ─────────────────────────────────────────────────────────

  fn saved_addresses(
    &self,
    customer_id: CustomerId,
  ) -> impl Future<Output = Result<Vec<SavedAddress>>> + Send + '_;

  fn create_address(
    &self,
    customer_id: CustomerId,
    address: NewAddress,
  ) -> impl Future<Output = Result<SavedAddress>> + Send + '_;

  // ── Checkout ──────────────────────────────────────────────────────────

  /// Check `code` against the pre-promo total `amount`.
  fn validate_promo(
    &self,
    code: String,
    amount: Decimal,
  ) -> impl Future<Output = Result<PromoValidation>> + Send + '_;

  /// Submit an order. A declined payment is a successful response whose
  /// `payment_status` is `FAILED`, not an error.
  fn create_order(
    &self,
    request: CreateOrderRequest,
  ) -> impl Future<Output = Result<OrderCreated>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  fn orders_by_customer(
    &self,
    customer_id: CustomerId,
    limit: u32,
  ) -> impl Future<Output = Result<OrdersByCustomer>> + Send + '_;

  fn order_detail(
    &self,
    order_id: OrderId,
    customer_id: CustomerId,
  ) -> impl Future<Output = Result<OrderDetail>> + Send + '_;

  fn order_timeline(
    &self,
    order_id: OrderId,
    customer_id: CustomerId,
  ) -> impl Future<Output = Result<Timeline>> + Send + '_;

  fn cancel_order(
    &self,
    order_id: OrderId,
    request: CancelOrderRequest,
  ) -> impl Future<Output = Result<CancelledOrder>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  /// Send a funnel beacon. Callers ignore failures.
  fn track(&self, step: FunnelStep) -> impl Future<Output = Result<()>> + Send + '_;
}
