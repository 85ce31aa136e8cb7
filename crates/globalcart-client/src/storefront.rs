//! [`StorefrontApi`] over HTTP, so the checkout and order drivers can run
//! against the real backend.

use globalcart_core::{
  api::StorefrontApi,
  model::{
    CancelOrderRequest, CancelledOrder, CreateOrderRequest, CustomerId, FunnelStep, NewAddress,
    OrderCreated, OrderDetail, OrderId, OrdersByCustomer, ProductDetail, ProductId,
    PromoValidation, SavedAddress, Timeline,
  },
};
use rust_decimal::Decimal;

use crate::ApiClient;

type CoreResult<T> = globalcart_core::Result<T>;

impl StorefrontApi for ApiClient {
  async fn product(&self, product_id: ProductId) -> CoreResult<ProductDetail> {
    Ok(ApiClient::product(self, product_id).await?)
  }

  async fn saved_addresses(&self, customer_id: CustomerId) -> CoreResult<Vec<SavedAddress>> {
    Ok(self.addresses(customer_id).await?)
  }

  async fn create_address(
    &self,
    customer_id: CustomerId,
    address: NewAddress,
  ) -> CoreResult<SavedAddress> {
    Ok(ApiClient::create_address(self, customer_id, &address).await?)
  }

  async fn validate_promo(&self, code: String, amount: Decimal) -> CoreResult<PromoValidation> {
    Ok(ApiClient::validate_promo(self, &code, amount).await?)
  }

  async fn create_order(&self, request: CreateOrderRequest) -> CoreResult<OrderCreated> {
    Ok(ApiClient::create_order(self, &request).await?)
  }

  async fn orders_by_customer(
    &self,
    customer_id: CustomerId,
    limit: u32,
  ) -> CoreResult<OrdersByCustomer> {
    Ok(ApiClient::orders_by_customer(self, customer_id, limit).await?)
  }

  async fn order_detail(&self, order_id: OrderId, customer_id: CustomerId) -> CoreResult<OrderDetail> {
    Ok(ApiClient::order_detail(self, order_id, customer_id).await?)
  }

  async fn order_timeline(&self, order_id: OrderId, customer_id: CustomerId) -> CoreResult<Timeline> {
    Ok(ApiClient::order_timeline(self, order_id, customer_id).await?)
  }

  async fn cancel_order(
    &self,
    order_id: OrderId,
    request: CancelOrderRequest,
  ) -> CoreResult<CancelledOrder> {
    Ok(ApiClient::cancel_order(self, order_id, &request).await?)
  }

  async fn track(&self, step: FunnelStep) -> CoreResult<()> {
    Ok(self.send_funnel_event(step).await?)
  }
}
