//! Order history, timelines and cancellation.
//!
//! Like checkout, the viewer is a pure machine: [`OrderViewer::handle`] takes
//! an [`Event`] and returns [`Effect`]s. Order status is never mutated
//! locally. After a cancellation the list is fetched again and whatever the
//! server says wins.

use std::collections::BTreeMap;

use tracing::info;

use crate::{
  error::{Error, Field, Outcome, Result, Rule},
  model::{CustomerId, OrderDetail, OrderId, OrderStatus, OrderSummary, Timeline, TimelineStage},
};

pub const DEFAULT_ORDER_LIMIT: u32 = 25;

/// Only orders that have not shipped can be cancelled.
pub fn can_cancel(order_status: &str) -> bool {
  let placed: &'static str = OrderStatus::Placed.into();
  order_status.trim().eq_ignore_ascii_case(placed)
}

// ─── Cancellation reasons ────────────────────────────────────────────────────

pub const OTHER_REASON: &str = "Other";

pub const REASON_PRESETS: &[&str] = &[
  "Order created by mistake",
  "Item(s) would not arrive on time",
  "Delivery cost too high",
  "Item price too high",
  "Found cheaper somewhere else",
  "Need to change shipping address",
  "Need to change shipping speed",
  "Need to change billing address",
  "Need to change payment method",
  OTHER_REASON,
];

/// A non-blank cancellation reason. The only way to build a cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationReason(String);

impl CancellationReason {
  pub fn parse(raw: &str) -> Result<Self> {
    let r = raw.trim();
    if r.is_empty() {
      return Err(Error::validation(Field::CancellationReason, Rule::Required));
    }
    Ok(Self(r.to_owned()))
  }

  /// A preset picked from the list. `Other` needs free text and is sent as
  /// `Other: <text>`.
  pub fn from_preset(preset: &str, other_text: Option<&str>) -> Result<Self> {
    if preset.trim() == OTHER_REASON {
      let text = other_text.map(str::trim).unwrap_or_default();
      if text.is_empty() {
        return Err(Error::validation(Field::CancellationReason, Rule::Required));
      }
      return Ok(Self(format!("{OTHER_REASON}: {text}")));
    }
    Self::parse(preset)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Timeline ────────────────────────────────────────────────────────────────

const SHIPPING_PATH: [OrderStatus; 3] =
  [OrderStatus::Placed, OrderStatus::Shipped, OrderStatus::Delivered];
const CANCEL_PATH: [OrderStatus; 2] = [OrderStatus::Placed, OrderStatus::Cancelled];

/// The stages to show for an order: placed/shipped/delivered, or
/// placed/cancelled when the order was cancelled. Timestamps come from the
/// server's stage list; missing stages have none.
pub fn display_stages(timeline: &Timeline) -> Vec<TimelineStage> {
  let cancelled = timeline
    .current_status
    .trim()
    .parse::<OrderStatus>()
    .is_ok_and(|s| s == OrderStatus::Cancelled);
  let path: &[OrderStatus] = if cancelled { &CANCEL_PATH } else { &SHIPPING_PATH };
  path
    .iter()
    .map(|status| {
      let name: &'static str = status.into();
      let timestamp = timeline
        .stages
        .iter()
        .find(|s| s.stage.eq_ignore_ascii_case(name))
        .and_then(|s| s.timestamp.clone());
      TimelineStage { stage: name.to_owned(), timestamp }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineView {
  Available {
    stages:              Vec<TimelineStage>,
    cancellation_reason: Option<String>,
  },
  /// The timeline could not be fetched; the order itself still renders.
  Unavailable,
}

impl TimelineView {
  pub fn from_result(result: Result<Timeline>) -> Self {
    match result {
      Ok(t) => Self::Available {
        stages:              display_stages(&t),
        cancellation_reason: t.cancellation_reason,
      },
      Err(_) => Self::Unavailable,
    }
  }
}

// ─── Viewer machine ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
  /// No customer is signed in. Distinct from having no orders.
  SignInRequired,
  Loading,
  Empty,
  Loaded(Vec<OrderSummary>),
  Failed(String),
}

#[derive(Debug, Clone)]
pub enum Event {
  /// Load (or reload) the order list for the signed-in customer.
  Open { customer_id: Option<CustomerId> },
  OrdersLoaded(Vec<OrderSummary>),
  OrdersFailed(String),
  DetailLoaded(OrderDetail),
  TimelineLoaded { order_id: OrderId, view: TimelineView },
  Cancel { order_id: OrderId, reason: String },
  Cancelled { order_id: OrderId, order_status: String },
  CancelFailed { order_id: OrderId, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  FetchOrders { customer_id: CustomerId, limit: u32 },
  FetchTimeline { order_id: OrderId, customer_id: CustomerId },
  CancelOrder {
    order_id:    OrderId,
    customer_id: CustomerId,
    reason:      CancellationReason,
  },
  Notify(String),
}

#[derive(Debug)]
pub struct OrderViewer {
  customer_id: Option<CustomerId>,
  limit:       u32,
  list:        ListState,
  details:     BTreeMap<OrderId, OrderDetail>,
  timelines:   BTreeMap<OrderId, TimelineView>,
  cancelling:  Option<OrderId>,
}

impl Default for OrderViewer {
  fn default() -> Self { Self::new(DEFAULT_ORDER_LIMIT) }
}

impl OrderViewer {
  pub fn new(limit: u32) -> Self {
    Self {
      customer_id: None,
      limit,
      list: ListState::SignInRequired,
      details: BTreeMap::new(),
      timelines: BTreeMap::new(),
      cancelling: None,
    }
  }

  pub fn list(&self) -> &ListState { &self.list }

  pub fn detail(&self, order_id: OrderId) -> Option<&OrderDetail> { self.details.get(&order_id) }

  pub fn timeline(&self, order_id: OrderId) -> Option<&TimelineView> {
    self.timelines.get(&order_id)
  }

  /// Freshest known status: detail if fetched after the list, else the list.
  fn status_of(&self, order_id: OrderId) -> Option<&str> {
    if let Some(d) = self.details.get(&order_id) {
      return Some(&d.order_status);
    }
    match &self.list {
      ListState::Loaded(orders) => orders
        .iter()
        .find(|o| o.order_id == order_id)
        .map(|o| o.order_status.as_str()),
      _ => None,
    }
  }

  /// Whether the cancel action should be offered for `order_id` right now.
  pub fn cancellable(&self, order_id: OrderId) -> bool {
    self.cancelling.is_none() && self.status_of(order_id).is_some_and(can_cancel)
  }

  pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>> {
    match event {
      Event::Open { customer_id } => {
        self.customer_id = customer_id;
        self.details.clear();
        self.timelines.clear();
        Ok(match customer_id {
          None => {
            self.list = ListState::SignInRequired;
            vec![]
          }
          Some(customer_id) => {
            self.list = ListState::Loading;
            vec![Effect::FetchOrders { customer_id, limit: self.limit }]
          }
        })
      }

      Event::OrdersLoaded(orders) => {
        if orders.is_empty() {
          self.list = ListState::Empty;
          return Ok(vec![]);
        }
        // A fresh list supersedes any detail fetched before it.
        self.details.clear();
        let effects = match self.customer_id {
          Some(customer_id) => orders
            .iter()
            .map(|o| Effect::FetchTimeline { order_id: o.order_id, customer_id })
            .collect(),
          None => vec![],
        };
        self.list = ListState::Loaded(orders);
        Ok(effects)
      }
      Event::OrdersFailed(message) => {
        self.list = ListState::Failed(message);
        Ok(vec![])
      }
      Event::DetailLoaded(detail) => {
        self.details.insert(detail.order_id, detail);
        Ok(vec![])
      }
      Event::TimelineLoaded { order_id, view } => {
        self.timelines.insert(order_id, view);
        Ok(vec![])
      }

      Event::Cancel { order_id, reason } => self.cancel(order_id, &reason),
      Event::Cancelled { order_id, order_status } => {
        self.cancelling = None;
        info!(order_id, %order_status, "order cancelled");
        let mut effects = vec![Effect::Notify(format!("Order #{order_id} cancelled."))];
        if let Some(customer_id) = self.customer_id {
          self.list = ListState::Loading;
          effects.push(Effect::FetchOrders { customer_id, limit: self.limit });
        }
        Ok(effects)
      }
      Event::CancelFailed { order_id, message } => {
        self.cancelling = None;
        Ok(vec![Effect::Notify(format!("Could not cancel order #{order_id}: {message}"))])
      }
    }
  }

  fn cancel(&mut self, order_id: OrderId, reason: &str) -> Result<Vec<Effect>> {
    let customer_id = self.customer_id.ok_or(Outcome::SignInRequired)?;
    if self.cancelling.is_some() {
      return Err(Error::InvalidTransition { action: "cancel", state: "cancelling" });
    }
    let status = self.status_of(order_id).unwrap_or_default();
    if !can_cancel(status) {
      return Err(Outcome::NotCancellable { status: status.to_owned() }.into());
    }
    let reason = CancellationReason::parse(reason)?;
    self.cancelling = Some(order_id);
    Ok(vec![Effect::CancelOrder { order_id, customer_id, reason }])
  }
}
