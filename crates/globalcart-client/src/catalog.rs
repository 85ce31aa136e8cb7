//! Product catalog, ratings and reviews.

use globalcart_core::{
  model::{CustomerId, Product, ProductDetail, ProductId},
  validate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::{ApiClient, RequestOptions, Result};

const BASE: &str = "/api/customer/products";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Sort {
  #[default]
  Default,
  PriceAsc,
  PriceDesc,
  BestSellers,
}

/// Parameters for [`ApiClient::products`].
#[derive(Debug, Clone)]
pub struct ProductQuery {
  pub limit:       u32,
  pub offset:      u32,
  pub category_l1: Option<String>,
  pub category_l2: Option<String>,
  pub sort:        Sort,
}

impl Default for ProductQuery {
  fn default() -> Self {
    Self { limit: 24, offset: 0, category_l1: None, category_l2: None, sort: Sort::Default }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
  pub product_id:     ProductId,
  pub average_rating: Decimal,
  pub rating_count:   u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   i64,
  pub product_id:  ProductId,
  pub customer_id: CustomerId,
  pub rating:      u8,
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub body:        Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
  pub rating: u8,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub body:   Option<String>,
}

/// Whether a customer may review a product. `reason` is set when not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEligibility {
  pub eligible: bool,
  #[serde(default)]
  pub reason:   Option<String>,
}

impl ApiClient {
  /// `GET /api/customer/products`
  pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
    let sort: &'static str = query.sort.into();
    let opts = RequestOptions::new()
      .query("limit", query.limit)
      .query("offset", query.offset)
      .query_opt("category_l1", query.category_l1.as_deref().filter(|c| !c.is_empty()))
      .query_opt("category_l2", query.category_l2.as_deref().filter(|c| !c.is_empty()))
      .query("sort", sort);
    self.get(BASE, opts).await
  }

  /// `GET /api/customer/products/{id}`, cached for the life of the client.
  pub async fn product(&self, product_id: ProductId) -> Result<ProductDetail> {
    if let Some(hit) = self.cached_product(product_id) {
      return Ok(hit);
    }
    let detail: ProductDetail = self.get(&format!("{BASE}/{product_id}"), RequestOptions::new()).await?;
    self.cache_product(&detail);
    Ok(detail)
  }

  /// Rating summary for a product. Degrades to `None` on any failure.
  pub async fn rating(&self, product_id: ProductId) -> Option<RatingSummary> {
    match self.get(&format!("{BASE}/{product_id}/rating"), RequestOptions::new()).await {
      Ok(r) => Some(r),
      Err(e) => {
        debug!(product_id, error = %e, "rating unavailable");
        None
      }
    }
  }

  pub async fn reviews(&self, product_id: ProductId, limit: u32, offset: u32) -> Result<Vec<Review>> {
    let opts = RequestOptions::new().query("limit", limit).query("offset", offset);
    self.get(&format!("{BASE}/{product_id}/reviews"), opts).await
  }

  pub async fn review_eligibility(
    &self,
    product_id: ProductId,
    customer_id: CustomerId,
  ) -> Result<ReviewEligibility> {
    let opts = RequestOptions::new().query("customer_id", customer_id);
    self.get(&format!("{BASE}/{product_id}/reviews/eligibility"), opts).await
  }

  /// Create or replace the customer's review of a product.
  pub async fn post_review(
    &self,
    product_id: ProductId,
    customer_id: CustomerId,
    review: &NewReview,
  ) -> Result<Review> {
    validate::rating(review.rating)?;
    let review = NewReview {
      rating: review.rating,
      title:  review.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned),
      body:   review.body.as_deref().map(str::trim).filter(|b| !b.is_empty()).map(str::to_owned),
    };
    let opts = RequestOptions::new().query("customer_id", customer_id);
    self.post(&format!("{BASE}/{product_id}/reviews"), &review, opts).await
  }
}
