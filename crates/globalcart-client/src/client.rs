//! Async HTTP client wrapping the GlobalCart JSON API.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::Duration,
};

use bytes::Bytes;
use globalcart_core::{
  model::{Device, ProductDetail, ProductId},
  storage::Persistence,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{RequestError, Result, rejection_message};

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Paths under this prefix carry the admin credential. Customer endpoints
/// refuse any request that carries it.
pub const ADMIN_PREFIX: &str = "/api/admin";

/// Percent-encode a free-form value for use as one URL path segment.
pub fn path_segment(value: &str) -> std::borrow::Cow<'_, str> { urlencoding::encode(value) }

/// Connection settings for the GlobalCart API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// No client-side timeout when unset.
  pub timeout:  Option<Duration>,
  /// Sales channel reported with funnel events.
  pub channel:  String,
  pub device:   Device,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8000".to_owned(),
      timeout:  None,
      channel:  "WEB".to_owned(),
      device:   Device::Desktop,
    }
  }
}

/// Extra query parameters and headers for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  pub query:   Vec<(String, String)>,
  pub headers: Vec<(String, String)>,
}

impl RequestOptions {
  pub fn new() -> Self { Self::default() }

  pub fn query(mut self, key: &str, value: impl ToString) -> Self {
    self.query.push((key.to_owned(), value.to_string()));
    self
  }

  /// Add `key=value` only when `value` is present.
  pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
    match value {
      Some(v) => self.query(key, v),
      None => self,
    }
  }

  pub fn header(mut self, key: &str, value: impl ToString) -> Self {
    self.headers.push((key.to_owned(), value.to_string()));
    self
  }
}

/// Async HTTP client for the GlobalCart REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`], the persistence handle and
/// the product cache are all shared.
#[derive(Clone)]
pub struct ApiClient {
  client:      Client,
  config:      ApiConfig,
  persistence: Arc<Persistence>,
  products:    Arc<Mutex<HashMap<ProductId, ProductDetail>>>,
}

impl ApiClient {
  pub fn new(config: ApiConfig, persistence: Arc<Persistence>) -> Result<Self> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(RequestError::Build)?;
    Ok(Self {
      client,
      config,
      persistence,
      products: Arc::new(Mutex::new(HashMap::new())),
    })
  }

  pub fn config(&self) -> &ApiConfig { &self.config }

  pub fn persistence(&self) -> &Arc<Persistence> { &self.persistence }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn admin_auth(&self, path: &str, req: RequestBuilder) -> RequestBuilder {
    if !path.starts_with(ADMIN_PREFIX) {
      return req;
    }
    match self.persistence.admin_key() {
      Some(key) => req.header(ADMIN_KEY_HEADER, key),
      None => req,
    }
  }

  fn request(&self, method: Method, path: &str, opts: &RequestOptions) -> RequestBuilder {
    let mut req = self.client.request(method, self.url(path));
    if !opts.query.is_empty() {
      req = req.query(&opts.query);
    }
    req = self.admin_auth(path, req);
    for (k, v) in &opts.headers {
      req = req.header(k.as_str(), v.as_str());
    }
    req
  }

  async fn send(&self, method: &Method, path: &str, req: RequestBuilder) -> Result<Response> {
    debug!(%method, path, "api request");
    let resp = req.send().await.map_err(|e| self.unreachable(e))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = rejection_message(status.as_u16(), &body);
    debug!(%method, path, status = status.as_u16(), %message, "api request rejected");
    Err(RequestError::Rejected { status: status.as_u16(), message })
  }

  fn unreachable(&self, source: reqwest::Error) -> RequestError {
    RequestError::Unreachable { base_url: self.config.base_url.clone(), source }
  }

  async fn decode<T: DeserializeOwned>(&self, path: &str, resp: Response) -> Result<T> {
    let raw = resp.bytes().await.map_err(|e| self.unreachable(e))?;
    // An empty success body reads as JSON `null`.
    let raw: &[u8] = if raw.iter().all(u8::is_ascii_whitespace) { b"null" } else { &raw };
    serde_json::from_slice(raw)
      .map_err(|source| RequestError::Decode { path: path.to_owned(), source })
  }

  // ── Verbs ─────────────────────────────────────────────────────────────

  pub async fn get<T: DeserializeOwned>(&self, path: &str, opts: RequestOptions) -> Result<T> {
    let req = self.request(Method::GET, path, &opts);
    let resp = self.send(&Method::GET, path, req).await?;
    self.decode(path, resp).await
  }

  pub async fn post<B, T>(&self, path: &str, body: &B, opts: RequestOptions) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let req = self.request(Method::POST, path, &opts).json(body);
    let resp = self.send(&Method::POST, path, req).await?;
    self.decode(path, resp).await
  }

  pub async fn put<B, T>(&self, path: &str, body: &B, opts: RequestOptions) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let req = self.request(Method::PUT, path, &opts).json(body);
    let resp = self.send(&Method::PUT, path, req).await?;
    self.decode(path, resp).await
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str, opts: RequestOptions) -> Result<T> {
    let req = self.request(Method::DELETE, path, &opts);
    let resp = self.send(&Method::DELETE, path, req).await?;
    self.decode(path, resp).await
  }

  /// GET a binary body, such as a rendered chart.
  pub async fn get_bytes(&self, path: &str, opts: RequestOptions) -> Result<Bytes> {
    let req = self.request(Method::GET, path, &opts);
    let resp = self.send(&Method::GET, path, req).await?;
    resp.bytes().await.map_err(|e| self.unreachable(e))
  }

  // ── Product cache ─────────────────────────────────────────────────────

  pub(crate) fn cached_product(&self, id: ProductId) -> Option<ProductDetail> {
    self.products.lock().unwrap_or_else(|e| e.into_inner()).get(&id).cloned()
  }

  pub(crate) fn cache_product(&self, detail: &ProductDetail) {
    self
      .products
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(detail.product.product_id, detail.clone());
  }
}
