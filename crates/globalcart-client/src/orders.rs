//! Order placement, history, timelines, cancellation and promo checks.

use globalcart_core::model::{
  CancelOrderRequest, CancelledOrder, CreateOrderRequest, CustomerId, OrderCreated, OrderDetail,
  OrderId, OrdersByCustomer, PromoValidation, Timeline,
};
use rust_decimal::Decimal;

use crate::{ApiClient, RequestOptions, Result};

const BASE: &str = "/api/customer";

impl ApiClient {
  pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderCreated> {
    self.post(&format!("{BASE}/orders"), request, RequestOptions::new()).await
  }

  pub async fn orders_by_customer(
    &self,
    customer_id: CustomerId,
    limit: u32,
  ) -> Result<OrdersByCustomer> {
    self
      .get(
        &format!("{BASE}/orders/by-customer/{customer_id}"),
        RequestOptions::new().query("limit", limit),
      )
      .await
  }

  pub async fn order_detail(&self, order_id: OrderId, customer_id: CustomerId) -> Result<OrderDetail> {
    self
      .get(
        &format!("{BASE}/orders/{order_id}"),
        RequestOptions::new().query("customer_id", customer_id),
      )
      .await
  }

  pub async fn order_timeline(&self, order_id: OrderId, customer_id: CustomerId) -> Result<Timeline> {
    self
      .get(
        &format!("{BASE}/orders/{order_id}/timeline"),
        RequestOptions::new().query("customer_id", customer_id),
      )
      .await
  }

  pub async fn cancel_order(
    &self,
    order_id: OrderId,
    request: &CancelOrderRequest,
  ) -> Result<CancelledOrder> {
    self
      .post(&format!("{BASE}/orders/{order_id}/cancel"), request, RequestOptions::new())
      .await
  }

  /// Check a promo code against the pre-promo total.
  pub async fn validate_promo(&self, code: &str, amount: Decimal) -> Result<PromoValidation> {
    let opts = RequestOptions::new().query("code", code.trim()).query("amount", amount);
    self.get(&format!("{BASE}/promos/validate"), opts).await
  }
}
