//! The signed-in customer's wishlist.

use std::collections::BTreeSet;

use globalcart_core::{
  error::Outcome,
  model::{CustomerId, Product, ProductId},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{ApiClient, RequestOptions, Result};

const BASE: &str = "/api/customer/wishlist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
  #[serde(flatten)]
  pub product:  Product,
  pub added_at: String,
}

impl ApiClient {
  fn wishlist_owner(&self) -> Result<CustomerId> {
    self
      .persistence()
      .customer()
      .map(|c| c.customer_id)
      .ok_or_else(|| globalcart_core::Error::from(Outcome::SignInRequired).into())
  }

  pub async fn wishlist(&self) -> Result<Vec<WishlistItem>> {
    let customer_id = self.wishlist_owner()?;
    self.get(BASE, RequestOptions::new().query("customer_id", customer_id)).await
  }

  /// Product ids on the wishlist, for marking catalog entries. Empty for
  /// guests and on any failure.
  pub async fn wishlist_ids(&self) -> BTreeSet<ProductId> {
    if self.persistence().customer().is_none() {
      return BTreeSet::new();
    }
    match self.wishlist().await {
      Ok(items) => items.into_iter().map(|i| i.product.product_id).collect(),
      Err(e) => {
        debug!(error = %e, "wishlist prefetch failed");
        BTreeSet::new()
      }
    }
  }

  pub async fn wishlist_add(&self, product_id: ProductId) -> Result<()> {
    let customer_id = self.wishlist_owner()?;
    let opts = RequestOptions::new().query("customer_id", customer_id);
    let _: Value = self.post(&format!("{BASE}/{product_id}"), &Value::Null, opts).await?;
    Ok(())
  }

  pub async fn wishlist_remove(&self, product_id: ProductId) -> Result<()> {
    let customer_id = self.wishlist_owner()?;
    let opts = RequestOptions::new().query("customer_id", customer_id);
    let _: Value = self.delete(&format!("{BASE}/{product_id}"), opts).await?;
    Ok(())
  }
}
