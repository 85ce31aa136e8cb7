//! Admin reporting: KPIs, funnel leakage, order monitor, audit log, session
//! journeys and rendered charts.
//!
//! Every request goes under [`ADMIN_PREFIX`](crate::client::ADMIN_PREFIX), so
//! the stored admin key is attached automatically. Signing in as admin never
//! touches the stored customer.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::future::join_all;
use globalcart_core::{
  model::{CustomerId, OrderId, ProductDetail, ProductId},
  storage::Durability,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use tracing::{info, warn};

use crate::{ApiClient, RequestOptions, Result, client::path_segment};

const BASE: &str = "/api/admin";

// ─── DTOs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Kpis {
  pub snapshot_ts:         String,
  pub label:               String,
  pub metrics:             BTreeMap<String, f64>,
  pub kpi_last_updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunnelSummary {
  pub window_days:                   u32,
  pub product_views:                 u64,
  pub add_to_cart:                   u64,
  pub checkout_started:              u64,
  pub payment_attempts:              u64,
  pub orders_placed:                 u64,
  pub conversion_rate:               f64,
  pub cart_abandonment_rate:         f64,
  pub payment_failure_rate:          f64,
  pub net_revenue_ex_tax:            Decimal,
  pub revenue_lost_cart_abandonment: Decimal,
  pub revenue_lost_payment_failures: Decimal,
  pub refunds_leakage:               Decimal,
  pub net_revenue_after_leakage:     Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductLeakage {
  pub product_id:                    ProductId,
  pub product_name:                  String,
  pub product_views:                 u64,
  pub add_to_cart:                   u64,
  pub abandoned_adds:                u64,
  pub revenue_lost_cart_abandonment: Decimal,
  pub failed_orders:                 u64,
  pub revenue_lost_payment_failures: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentFailure {
  pub event_dt:               String,
  pub payment_method:         String,
  pub payment_provider:       String,
  #[serde(default)]
  pub failure_reason:         Option<String>,
  pub failed_payments:        u64,
  pub amount_attempted:       Decimal,
  pub revenue_at_risk_ex_tax: Decimal,
}

/// The three funnel panels, fetched together.
#[derive(Debug)]
pub struct FunnelReport {
  pub summary:          Result<FunnelSummary>,
  pub product_leakage:  Result<Vec<ProductLeakage>>,
  pub payment_failures: Result<Vec<PaymentFailure>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminOrder {
  pub order_id:       OrderId,
  pub customer_id:    CustomerId,
  #[serde(default)]
  pub customer_name:  Option<String>,
  #[serde(default)]
  pub customer_email: Option<String>,
  pub order_ts:       String,
  pub order_status:   String,
  pub net_amount:     Decimal,
  #[serde(default)]
  pub channel:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditEntry {
  pub event_ts:   String,
  pub order_id:   OrderId,
  pub action:     String,
  #[serde(default)]
  pub reason:     Option<String>,
  pub actor_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JourneySession {
  pub session_id:     String,
  #[serde(default)]
  pub customer_id:    Option<CustomerId>,
  pub first_event_ts: String,
  pub last_event_ts:  String,
  pub event_count:    u64,
  #[serde(default)]
  pub channel:        Option<String>,
  #[serde(default)]
  pub device:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JourneyEvent {
  pub event_id:       i64,
  pub event_ts:       String,
  pub session_id:     String,
  #[serde(default)]
  pub customer_id:    Option<CustomerId>,
  pub stage:          String,
  #[serde(default)]
  pub channel:        Option<String>,
  #[serde(default)]
  pub device:         Option<String>,
  #[serde(default)]
  pub product_id:     Option<ProductId>,
  #[serde(default)]
  pub order_id:       Option<OrderId>,
  #[serde(default)]
  pub failure_reason: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  admin_key: String,
}

// ─── Query parameters ────────────────────────────────────────────────────────

/// Limit and offset for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit:  u32,
  pub offset: u32,
}

impl Page {
  pub fn first(limit: u32) -> Self { Self { limit, offset: 0 } }

  fn options(self) -> RequestOptions {
    RequestOptions::new().query("limit", self.limit).query("offset", self.offset)
  }
}

/// Server-rendered PNG charts on the analytics dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Chart {
  SalesTrend,
  OrdersVsRevenue,
  FunnelConversion,
  TopProducts,
  CategoryContribution,
  RefundLeakage,
}

impl Chart {
  pub fn name(self) -> &'static str { self.into() }

  /// Trend charts use the long window, performance charts the short one.
  fn options(self, params: &ChartParams) -> RequestOptions {
    let opts = RequestOptions::new();
    match self {
      Self::SalesTrend | Self::OrdersVsRevenue | Self::RefundLeakage => {
        opts.query("window_days", params.trend_days)
      }
      Self::FunnelConversion => opts.query("window_days", params.perf_days),
      Self::TopProducts => {
        opts.query("window_days", params.perf_days).query("top_n", params.top_n)
      }
      Self::CategoryContribution => opts
        .query("window_days", params.perf_days)
        .query("level", &params.category_level)
        .query("top_n", params.top_n),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartParams {
  pub trend_days:     u32,
  pub perf_days:      u32,
  pub top_n:          u32,
  pub category_level: String,
}

impl Default for ChartParams {
  fn default() -> Self {
    Self {
      trend_days:     90,
      perf_days:      30,
      top_n:          10,
      category_level: "category_l1".to_owned(),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Admin-facing wrapper over [`ApiClient`].
#[derive(Clone)]
pub struct AdminClient {
  api: ApiClient,
}

impl AdminClient {
  pub fn new(api: ApiClient) -> Self { Self { api } }

  pub fn api(&self) -> &ApiClient { &self.api }

  pub fn is_signed_in(&self) -> bool { self.api.persistence().admin_key().is_some() }

  /// Exchange credentials for an admin key and store it. The returned
  /// [`Durability`] says whether it will survive a restart.
  pub async fn login(&self, username: &str, password: &str) -> Result<Durability> {
    let body = LoginRequest { username: username.trim(), password };
    let out: LoginResponse =
      self.api.post(&format!("{BASE}/login"), &body, RequestOptions::new()).await?;
    let durability = self.api.persistence().set_admin_key(Some(&out.admin_key));
    if durability == Durability::MemoryOnly {
      warn!("admin key could not be persisted; it lasts for this process only");
    }
    info!("admin signed in");
    Ok(durability)
  }

  pub fn logout(&self) { self.api.persistence().set_admin_key(None); }

  pub async fn kpis_latest(&self) -> Result<Kpis> {
    self.api.get(&format!("{BASE}/kpis/latest"), RequestOptions::new()).await
  }

  pub async fn funnel_summary(&self, window_days: u32) -> Result<FunnelSummary> {
    self
      .api
      .get(
        &format!("{BASE}/funnel/summary"),
        RequestOptions::new().query("window_days", window_days),
      )
      .await
  }

  pub async fn product_leakage(&self, page: Page) -> Result<Vec<ProductLeakage>> {
    self.api.get(&format!("{BASE}/funnel/product-leakage"), page.options()).await
  }

  pub async fn payment_failures(&self, window_days: u32, page: Page) -> Result<Vec<PaymentFailure>> {
    self
      .api
      .get(
        &format!("{BASE}/funnel/payment-failures"),
        page.options().query("window_days", window_days),
      )
      .await
  }

  /// All three funnel panels at once; each succeeds or fails on its own.
  pub async fn funnel(&self, window_days: u32, page: Page) -> FunnelReport {
    let (summary, product_leakage, payment_failures) = futures::join!(
      self.funnel_summary(window_days),
      self.product_leakage(page),
      self.payment_failures(window_days, page),
    );
    FunnelReport { summary, product_leakage, payment_failures }
  }

  pub async fn orders(&self, page: Page) -> Result<Vec<AdminOrder>> {
    self.api.get(&format!("{BASE}/orders"), page.options()).await
  }

  pub async fn audit_log(&self, page: Page) -> Result<Vec<AuditEntry>> {
    self.api.get(&format!("{BASE}/audit-log"), page.options()).await
  }

  pub async fn journey_sessions(
    &self,
    window_hours: u32,
    customer_id: Option<CustomerId>,
    page: Page,
  ) -> Result<Vec<JourneySession>> {
    let opts = page
      .options()
      .query("window_hours", window_hours)
      .query_opt("customer_id", customer_id);
    self.api.get(&format!("{BASE}/journey/sessions"), opts).await
  }

  pub async fn journey_events(&self, session_id: &str) -> Result<Vec<JourneyEvent>> {
    let path = format!("{BASE}/journey/session/{}/events", path_segment(session_id));
    self.api.get(&path, RequestOptions::new()).await
  }

  pub async fn journey_product(&self, product_id: ProductId) -> Result<ProductDetail> {
    self.api.get(&format!("{BASE}/products/{product_id}"), RequestOptions::new()).await
  }

  pub async fn chart(&self, chart: Chart, params: &ChartParams) -> Result<Bytes> {
    let path = format!("{BASE}/analytics/{}", chart.name());
    self.api.get_bytes(&path, chart.options(params)).await
  }

  /// Request every chart concurrently. One chart failing never affects the
  /// others.
  pub async fn refresh_charts(&self, params: &ChartParams) -> Vec<(Chart, Result<Bytes>)> {
    let charts: Vec<Chart> = Chart::iter().collect();
    let results = join_all(charts.iter().map(|&c| self.chart(c, params))).await;
    charts.into_iter().zip(results).collect()
  }
}
