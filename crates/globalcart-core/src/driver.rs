//! Async drivers that run the checkout and order machines against a
//! [`StorefrontApi`].
//!
//! A driver feeds one event to its machine, performs the resulting IO
//! effects, and feeds the outcomes back until the machine goes quiet. UI
//! effects (notices, focus, navigation) are collected for the caller.

use std::collections::VecDeque;

use futures::future::join_all;
use tracing::debug;

use crate::{
  api::StorefrontApi,
  cart::CartEngine,
  checkout::{Checkout, CheckoutConfig, Effect, Event},
  error::Result,
  model::{CancelOrderRequest, Customer, CustomerId, OrderDetail, OrderId, OrderSummary},
  orders::{self, OrderViewer, TimelineView},
};

// ─── Checkout ────────────────────────────────────────────────────────────────

pub struct CheckoutRunner<'a, A> {
  api:     &'a A,
  cart:    &'a CartEngine,
  machine: Checkout,
  ui:      Vec<Effect>,
}

impl<'a, A: StorefrontApi> CheckoutRunner<'a, A> {
  pub fn new(api: &'a A, cart: &'a CartEngine, config: CheckoutConfig) -> Self {
    Self { api, cart, machine: Checkout::new(config), ui: Vec::new() }
  }

  pub fn machine(&self) -> &Checkout { &self.machine }

  /// Start a checkout attempt over the current persisted cart.
  pub async fn begin(&mut self, customer: Option<Customer>) -> Result<()> {
    let cart = self.cart.snapshot();
    self.dispatch(Event::Begin { cart, customer }).await
  }

  pub async fn dispatch(&mut self, event: Event) -> Result<()> {
    let mut queue = VecDeque::from([event]);
    while let Some(event) = queue.pop_front() {
      for effect in self.machine.handle(event)? {
        queue.extend(self.perform(effect).await);
      }
    }
    Ok(())
  }

  /// Notices, focus requests and navigation produced so far.
  pub fn take_ui_effects(&mut self) -> Vec<Effect> { std::mem::take(&mut self.ui) }

  async fn perform(&mut self, effect: Effect) -> Vec<Event> {
    let api = self.api;
    match effect {
      Effect::FetchProducts(ids) => {
        let results = join_all(ids.iter().map(|id| api.product(*id))).await;
        ids
          .into_iter()
          .zip(results)
          .map(|(product_id, r)| match r {
            Ok(detail) => Event::ProductLoaded(detail),
            Err(e) => Event::ProductFailed { product_id, message: e.to_string() },
          })
          .collect()
      }
      Effect::LoadSavedAddresses(customer_id) => {
        let list = api.saved_addresses(customer_id).await.unwrap_or_else(|e| {
          debug!(customer_id, error = %e, "saved addresses unavailable");
          Vec::new()
        });
        vec![Event::SavedAddressesLoaded(list)]
      }
      Effect::ValidatePromo { code, amount } => {
        vec![match api.validate_promo(code.clone(), amount).await {
          Ok(result) => Event::PromoValidated { code, result },
          Err(e) => Event::PromoFailed { code, message: e.to_string() },
        }]
      }
      Effect::SaveAddress { token, customer_id, address } => {
        vec![match api.create_address(customer_id, address).await {
          Ok(address) => Event::AddressSaved { token, address },
          Err(e) => Event::AddressSaveFailed { token, message: e.to_string() },
        }]
      }
      Effect::CreateOrder { token, request } => {
        vec![match api.create_order(request).await {
          Ok(created) => Event::OrderCreated { token, created },
          Err(e) => Event::OrderFailed { token, message: e.to_string() },
        }]
      }
      Effect::ClearCart => {
        self.cart.clear();
        vec![]
      }
      Effect::Track(step) => {
        let stage = step.stage;
        if let Err(e) = api.track(step).await {
          debug!(%stage, error = %e, "funnel beacon dropped");
        }
        vec![]
      }
      ui @ (Effect::Notify(_) | Effect::FocusField(_) | Effect::NavigateToOrders { .. }) => {
        self.ui.push(ui);
        vec![]
      }
    }
  }
}

// ─── Orders ──────────────────────────────────────────────────────────────────

pub struct OrderLifecycle<'a, A> {
  api:     &'a A,
  viewer:  OrderViewer,
  notices: Vec<String>,
}

impl<'a, A: StorefrontApi> OrderLifecycle<'a, A> {
  pub fn new(api: &'a A, limit: u32) -> Self {
    Self { api, viewer: OrderViewer::new(limit), notices: Vec::new() }
  }

  pub fn viewer(&self) -> &OrderViewer { &self.viewer }

  pub fn take_notices(&mut self) -> Vec<String> { std::mem::take(&mut self.notices) }

  /// Load the order list and every order's timeline.
  pub async fn open(&mut self, customer_id: Option<CustomerId>) -> Result<()> {
    self.dispatch(orders::Event::Open { customer_id }).await
  }

  /// Fetch one order and its timeline side by side. A missing timeline does
  /// not fail the detail.
  pub async fn detail(
    &mut self,
    order_id: OrderId,
    customer_id: CustomerId,
  ) -> Result<(OrderDetail, TimelineView)> {
    let (detail, timeline) = futures::join!(
      self.api.order_detail(order_id, customer_id),
      self.api.order_timeline(order_id, customer_id),
    );
    let detail = detail?;
    let view = TimelineView::from_result(timeline);
    self.viewer.handle(orders::Event::DetailLoaded(detail.clone()))?;
    self.viewer.handle(orders::Event::TimelineLoaded { order_id, view: view.clone() })?;
    Ok((detail, view))
  }

  /// Cancel `order_id`. Precondition and reason are checked before any
  /// network call; on success the list is fetched again.
  pub async fn cancel(&mut self, order_id: OrderId, reason: &str) -> Result<()> {
    self
      .dispatch(orders::Event::Cancel { order_id, reason: reason.to_owned() })
      .await
  }

  pub fn orders(&self) -> &[OrderSummary] {
    match self.viewer.list() {
      orders::ListState::Loaded(list) => list,
      _ => &[],
    }
  }

  async fn dispatch(&mut self, event: orders::Event) -> Result<()> {
    let api = self.api;
    let mut queue = VecDeque::from([event]);
    while let Some(event) = queue.pop_front() {
      let mut timelines = Vec::new();
      for effect in self.viewer.handle(event)? {
        match effect {
          orders::Effect::FetchOrders { customer_id, limit } => {
            queue.push_back(match api.orders_by_customer(customer_id, limit).await {
              Ok(list) => orders::Event::OrdersLoaded(list.orders),
              Err(e) => orders::Event::OrdersFailed(e.to_string()),
            });
          }
          orders::Effect::FetchTimeline { order_id, customer_id } => {
            timelines.push((order_id, customer_id));
          }
          orders::Effect::CancelOrder { order_id, customer_id, reason } => {
            let request = CancelOrderRequest { customer_id, reason: reason.as_str().to_owned() };
            match api.cancel_order(order_id, request).await {
              Ok(c) => queue.push_back(orders::Event::Cancelled {
                order_id:     c.order_id,
                order_status: c.order_status,
              }),
              Err(e) => {
                let message = e.to_string();
                for fx in self.viewer.handle(orders::Event::CancelFailed { order_id, message })? {
                  if let orders::Effect::Notify(n) = fx {
                    self.notices.push(n);
                  }
                }
                return Err(e);
              }
            }
          }
          orders::Effect::Notify(n) => self.notices.push(n),
        }
      }

      // Each timeline stands alone; one failure only degrades its own order.
      let fetched = join_all(
        timelines
          .iter()
          .map(|(order_id, customer_id)| api.order_timeline(*order_id, *customer_id)),
      )
      .await;
      for ((order_id, _), result) in timelines.into_iter().zip(fetched) {
        queue.push_back(orders::Event::TimelineLoaded {
          order_id,
          view: TimelineView::from_result(result),
        });
      }
    }
    Ok(())
  }
}
