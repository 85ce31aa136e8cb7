use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex},
  time::Duration,
};

use rust_decimal::Decimal;

use crate::{
  api::StorefrontApi,
  cart::CartEngine,
  checkout::{Checkout, CheckoutConfig, CheckoutState, Effect, Event, Notice},
  driver::{CheckoutRunner, OrderLifecycle},
  error::{Error, Field, Result},
  model::*,
  orders::TimelineView,
  storage::Persistence,
};

// ─── Fake API ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
  Product(ProductId),
  SavedAddresses(CustomerId),
  CreateAddress(NewAddress),
  ValidatePromo(String, Decimal),
  CreateOrder(CreateOrderRequest),
  Orders(CustomerId),
  Detail(OrderId),
  Timeline(OrderId),
  Cancel(OrderId, String),
  Track(FunnelStep),
}

#[derive(Default)]
struct FakeApi {
  products:          HashMap<ProductId, ProductDetail>,
  saved:             Mutex<Vec<SavedAddress>>,
  fail_address_save: bool,
  promo:             Option<PromoValidation>,
  payment_status:    Option<String>,
  fail_order:        bool,
  orders:            Mutex<Vec<OrderSummary>>,
  broken_timelines:  HashSet<OrderId>,
  fail_cancel:       bool,
  fail_track:        bool,
  calls:             Mutex<Vec<Call>>,
}

impl FakeApi {
  fn record(&self, call: Call) { self.calls.lock().unwrap().push(call); }

  fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

  fn order_requests(&self) -> Vec<CreateOrderRequest> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::CreateOrder(r) => Some(r),
        _ => None,
      })
      .collect()
  }

  fn tracked(&self) -> Vec<FunnelStep> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::Track(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  fn with_product(mut self, id: ProductId, price: &str) -> Self {
    self.products.insert(id, product(id, price));
    self
  }
}

fn rejected(detail: &str) -> Error {
  Error::Rejected { status: 400, detail: detail.to_owned() }
}

impl StorefrontApi for FakeApi {
  async fn product(&self, product_id: ProductId) -> Result<ProductDetail> {
    self.record(Call::Product(product_id));
    self.products.get(&product_id).cloned().ok_or_else(|| rejected("Product not found"))
  }

  async fn saved_addresses(&self, customer_id: CustomerId) -> Result<Vec<SavedAddress>> {
    self.record(Call::SavedAddresses(customer_id));
    Ok(self.saved.lock().unwrap().clone())
  }

  async fn create_address(
    &self,
    _customer_id: CustomerId,
    address: NewAddress,
  ) -> Result<SavedAddress> {
    self.record(Call::CreateAddress(address.clone()));
    if self.fail_address_save {
      return Err(rejected("Address book full"));
    }
    Ok(saved_address(99, &address.address, address.is_default))
  }

  async fn validate_promo(&self, code: String, amount: Decimal) -> Result<PromoValidation> {
    self.record(Call::ValidatePromo(code, amount));
    self.promo.clone().ok_or_else(|| Error::Unreachable("down".into()))
  }

  async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderCreated> {
    self.record(Call::CreateOrder(request.clone()));
    if self.fail_order {
      return Err(rejected("Insufficient stock"));
    }
    Ok(OrderCreated {
      order_id:              501,
      net_amount:            Decimal::new(1070, 0),
      order_status:          Some("PLACED".into()),
      payment_status:        self.payment_status.clone(),
      promo_code:            request.promo_code,
      promo_discount_amount: None,
    })
  }

  async fn orders_by_customer(&self, customer_id: CustomerId, _limit: u32) -> Result<OrdersByCustomer> {
    self.record(Call::Orders(customer_id));
    Ok(OrdersByCustomer { customer_id, orders: self.orders.lock().unwrap().clone() })
  }

  async fn order_detail(&self, order_id: OrderId, customer_id: CustomerId) -> Result<OrderDetail> {
    self.record(Call::Detail(order_id));
    let orders = self.orders.lock().unwrap();
    let o = orders
      .iter()
      .find(|o| o.order_id == order_id)
      .ok_or_else(|| Error::Rejected { status: 404, detail: "Order not found".into() })?;
    Ok(OrderDetail {
      order_id,
      customer_id,
      order_ts: o.order_ts.clone(),
      order_status: o.order_status.clone(),
      payment_status: Some("SUCCESS".into()),
      net_amount: o.net_amount,
      gross_amount: o.net_amount,
      discount_amount: Decimal::ZERO,
      tax_amount: Decimal::ZERO,
      promo_code: None,
      promo_discount_amount: None,
      items: o.items.clone(),
    })
  }

  async fn order_timeline(&self, order_id: OrderId, _customer_id: CustomerId) -> Result<Timeline> {
    self.record(Call::Timeline(order_id));
    if self.broken_timelines.contains(&order_id) {
      return Err(Error::Rejected { status: 500, detail: "boom".into() });
    }
    let status = self
      .orders
      .lock()
      .unwrap()
      .iter()
      .find(|o| o.order_id == order_id)
      .map(|o| o.order_status.clone())
      .unwrap_or_default();
    Ok(Timeline {
      order_id,
      current_status: status,
      stages: vec![TimelineStage { stage: "PLACED".into(), timestamp: Some("t0".into()) }],
      cancellation_reason: None,
    })
  }

  async fn cancel_order(
    &self,
    order_id: OrderId,
    request: CancelOrderRequest,
  ) -> Result<CancelledOrder> {
    self.record(Call::Cancel(order_id, request.reason));
    if self.fail_cancel {
      return Err(Error::Rejected { status: 409, detail: "Order already shipped".into() });
    }
    let mut orders = self.orders.lock().unwrap();
    if let Some(o) = orders.iter_mut().find(|o| o.order_id == order_id) {
      o.order_status = "CANCELLED".into();
    }
    Ok(CancelledOrder { order_id, order_status: "CANCELLED".into() })
  }

  async fn track(&self, step: FunnelStep) -> Result<()> {
    self.record(Call::Track(step));
    if self.fail_track {
      return Err(Error::Unreachable("beacon down".into()));
    }
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn d(s: &str) -> Decimal { s.parse().unwrap() }

fn product(id: ProductId, price: &str) -> ProductDetail {
  ProductDetail {
    product:     Product {
      product_id:   id,
      sku:          format!("SKU-{id}"),
      product_name: format!("Product {id}"),
      category_l1:  "Electronics".into(),
      category_l2:  "Audio".into(),
      brand:        "Acme".into(),
      list_price:   d(price),
      discount_pct: 0,
      sell_price:   d(price),
      image_url:    String::new(),
    },
    description: String::new(),
    in_stock:    true,
    stock_qty:   10,
  }
}

fn address() -> Address {
  Address {
    recipient_name: "Asha Rao".into(),
    phone:          "9876543210".into(),
    address_line1:  "12 MG Road".into(),
    address_line2:  String::new(),
    city:           "Bengaluru".into(),
    state:          "KA".into(),
    postal_code:    "560001".into(),
    country:        "India".into(),
  }
}

fn saved_address(id: AddressId, a: &Address, is_default: bool) -> SavedAddress {
  SavedAddress {
    address_id: id,
    label: None,
    recipient_name: a.recipient_name.clone(),
    phone: a.phone.clone(),
    address_line1: a.address_line1.clone(),
    address_line2: Some(a.address_line2.clone()),
    city: a.city.clone(),
    state: a.state.clone(),
    postal_code: a.postal_code.clone(),
    country: a.country.clone(),
    is_default,
  }
}

fn customer() -> Customer {
  Customer { customer_id: 7, email: "asha@example.com".into(), display_name: None }
}

fn cart_with(lines: &[(ProductId, i64)]) -> CartEngine {
  let cart = CartEngine::new(Arc::new(Persistence::in_memory()));
  for (id, qty) in lines {
    cart.add_item(*id, *qty);
  }
  cart
}

fn notices(fx: &[Effect]) -> Vec<Notice> {
  fx.iter()
    .filter_map(|e| match e {
      Effect::Notify(n) => Some(n.clone()),
      _ => None,
    })
    .collect()
}

fn stages(api: &FakeApi) -> Vec<FunnelStage> { api.tracked().into_iter().map(|s| s.stage).collect() }

// ─── Checkout ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_cart_cannot_checkout() {
  let api = FakeApi::default();
  let cart = cart_with(&[]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::CannotCheckout);
  assert!(api.calls().is_empty());
  assert_eq!(notices(&run.take_ui_effects()), vec![Notice::CartEmpty]);

  // Terminal: nothing moves it towards submission.
  assert!(matches!(run.dispatch(Event::Submit).await, Err(Error::InvalidTransition { .. })));
  assert!(matches!(
    run.dispatch(Event::EditAddress(address())).await,
    Err(Error::InvalidTransition { .. })
  ));
  assert!(api.order_requests().is_empty());
}

#[tokio::test]
async fn guest_checkout_confirms_and_clears_cart() {
  let api = FakeApi::default().with_product(1, "250.00").with_product(2, "500.00");
  let cart = cart_with(&[(1, 2), (2, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());

  run.begin(None).await.unwrap();
  assert_eq!(run.machine().state(), &CheckoutState::AddressPending);
  assert_eq!(run.machine().totals().subtotal, d("1000"));
  assert!(!api.calls().iter().any(|c| matches!(c, Call::SavedAddresses(_))));

  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::Confirmed { order_id: 501 });
  let reqs = api.order_requests();
  assert_eq!(reqs.len(), 1);
  let req = &reqs[0];
  assert_eq!(req.channel, "WEB");
  assert_eq!(req.currency, "INR");
  assert_eq!(req.customer_id, None);
  assert_eq!(req.promo_code, None);
  assert_eq!(req.payment_method, PaymentMethod::Upi);
  assert!(!req.simulate_payment_failure);
  assert_eq!(req.failure_reason, None);
  assert_eq!(req.items.len(), 2);
  assert_eq!(req.address.as_ref().map(|a| a.city.as_str()), Some("Bengaluru"));

  assert!(cart.snapshot().is_empty());
  assert_eq!(stages(&api), vec![
    FunnelStage::CheckoutStarted,
    FunnelStage::PaymentAttempted,
    FunnelStage::OrderPlaced,
  ]);
  let ui = run.take_ui_effects();
  assert!(ui.contains(&Effect::NavigateToOrders { after: Duration::from_millis(5800) }));
  assert!(notices(&ui).contains(&Notice::OrderConfirmed { order_id: 501 }));
}

#[tokio::test]
async fn invalid_address_blocks_submission() {
  let api = FakeApi::default().with_product(1, "100");
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();

  let mut a = address();
  a.phone = "12345".into();
  a.postal_code = "12".into();
  run.dispatch(Event::EditAddress(a)).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::AddressPending);
  assert!(api.order_requests().is_empty());
  assert!(run.take_ui_effects().contains(&Effect::FocusField(Field::Phone)));
  // The attempt is tracked before validation runs.
  assert_eq!(stages(&api).last(), Some(&FunnelStage::PaymentAttempted));
  assert_eq!(cart.count(), 1);
}

#[tokio::test]
async fn declined_payment_keeps_cart() {
  let api = FakeApi {
    payment_status: Some("failed".into()),
    ..FakeApi::default().with_product(1, "100")
  };
  let cart = cart_with(&[(1, 3)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::SetSimulatedFailure(Some(String::new()))).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::PaymentFailed { order_id: 501 });
  assert_eq!(cart.count(), 3);
  let req = &api.order_requests()[0];
  assert!(req.simulate_payment_failure);
  assert_eq!(req.failure_reason.as_deref(), Some("BANK_DECLINED"));

  let failed = api.tracked().into_iter().find(|s| s.stage == FunnelStage::PaymentFailed).unwrap();
  assert_eq!(failed.order_id, Some(501));
  assert_eq!(failed.failure_reason.as_deref(), Some("BANK_DECLINED"));
  assert!(!run.take_ui_effects().iter().any(|e| matches!(e, Effect::NavigateToOrders { .. })));

  // Retry from the failed state is allowed.
  run.dispatch(Event::SetSimulatedFailure(None)).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();
  assert_eq!(api.order_requests().len(), 2);
}

#[tokio::test]
async fn failed_address_save_prevents_order() {
  let api = FakeApi { fail_address_save: true, ..FakeApi::default().with_product(1, "100") };
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(Some(customer())).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::SetSaveAddress(true)).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert!(matches!(run.machine().state(), CheckoutState::Error { .. }));
  assert!(api.order_requests().is_empty());
  assert_eq!(cart.count(), 1);
  assert!(!run.machine().submission_in_flight());
}

#[tokio::test]
async fn saved_address_is_selected_before_ordering() {
  let api = FakeApi::default().with_product(1, "100");
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(Some(customer())).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::SetSaveAddress(true)).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  let calls = api.calls();
  let save_at = calls.iter().position(|c| matches!(c, Call::CreateAddress(_))).unwrap();
  let order_at = calls.iter().position(|c| matches!(c, Call::CreateOrder(_))).unwrap();
  assert!(save_at < order_at);
  match &calls[save_at] {
    Call::CreateAddress(a) => assert!(a.is_default),
    _ => unreachable!(),
  }
  assert_eq!(run.machine().selected_saved(), Some(99));
  assert_eq!(api.order_requests()[0].customer_id, Some(7));
  assert_eq!(run.machine().state(), &CheckoutState::Confirmed { order_id: 501 });
}

#[tokio::test]
async fn guest_cannot_save_address() {
  let api = FakeApi::default().with_product(1, "100");
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::SetSaveAddress(true)).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::AddressPending);
  assert!(!api.calls().iter().any(|c| matches!(c, Call::CreateAddress(_) | Call::CreateOrder(_))));
  assert!(notices(&run.take_ui_effects()).contains(&Notice::SignInToSaveAddress));
}

#[tokio::test]
async fn default_saved_address_is_preselected_and_skips_validation() {
  let mut broken = address();
  broken.phone = "not a phone".into();
  let api = FakeApi {
    saved: Mutex::new(vec![
      saved_address(1, &address(), false),
      saved_address(2, &broken, true),
    ]),
    ..FakeApi::default().with_product(1, "100")
  };
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(Some(customer())).await.unwrap();
  assert_eq!(run.machine().selected_saved(), Some(2));
  assert_eq!(run.machine().draft().phone, "not a phone");

  run.dispatch(Event::Submit).await.unwrap();
  assert_eq!(run.machine().state(), &CheckoutState::Confirmed { order_id: 501 });
}

#[tokio::test]
async fn promo_applies_and_totals_follow() {
  let api = FakeApi {
    promo: Some(PromoValidation {
      code:            None,
      valid:           true,
      discount_amount: Some(d("100")),
      message:         None,
    }),
    ..FakeApi::default().with_product(1, "1000")
  };
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();
  run.dispatch(Event::ApplyPromo(" save10 ".into())).await.unwrap();

  assert!(api.calls().contains(&Call::ValidatePromo("save10".into(), d("1070"))));
  let promo = run.machine().promo().unwrap();
  assert_eq!(promo.code, "SAVE10");
  let t = run.machine().totals();
  assert_eq!(t.tax, d("70"));
  assert_eq!(t.pre_promo_total, d("1070"));
  assert_eq!(t.payable, d("970"));

  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();
  assert_eq!(api.order_requests()[0].promo_code.as_deref(), Some("SAVE10"));
}

#[test]
fn rejected_promo_clears_previous_one() {
  let mut machine = Checkout::default();
  let cart = cart_with(&[(1, 1)]).snapshot();
  machine.handle(Event::Begin { cart, customer: None }).unwrap();

  machine.handle(Event::ApplyPromo("A".into())).unwrap();
  machine
    .handle(Event::PromoValidated {
      code:   "A".into(),
      result: PromoValidation { code: None, valid: true, discount_amount: Some(d("5")), message: None },
    })
    .unwrap();
  assert!(machine.promo().is_some());

  machine.handle(Event::ApplyPromo("B".into())).unwrap();
  let fx = machine
    .handle(Event::PromoValidated {
      code:   "B".into(),
      result: PromoValidation { code: None, valid: false, discount_amount: None, message: None },
    })
    .unwrap();
  assert!(machine.promo().is_none());
  assert_eq!(notices(&fx), vec![Notice::PromoRejected("Invalid promo code.".into())]);

  let fx = machine.handle(Event::ApplyPromo("   ".into())).unwrap();
  assert_eq!(notices(&fx), vec![Notice::EnterPromoCode]);
}

#[tokio::test]
async fn order_error_allows_retry_in_place() {
  let api = FakeApi { fail_order: true, ..FakeApi::default().with_product(1, "100") };
  let cart = cart_with(&[(1, 2)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();

  assert_eq!(run.machine().state(), &CheckoutState::Error { message: "Insufficient stock".into() });
  assert_eq!(cart.count(), 2);
  run.dispatch(Event::Submit).await.unwrap();
  assert_eq!(api.order_requests().len(), 2);
}

#[tokio::test]
async fn beacon_failures_are_swallowed() {
  let api = FakeApi { fail_track: true, ..FakeApi::default().with_product(1, "100") };
  let cart = cart_with(&[(1, 1)]);
  let mut run = CheckoutRunner::new(&api, &cart, CheckoutConfig::default());
  run.begin(None).await.unwrap();
  run.dispatch(Event::EditAddress(address())).await.unwrap();
  run.dispatch(Event::Submit).await.unwrap();
  assert_eq!(run.machine().state(), &CheckoutState::Confirmed { order_id: 501 });
}

#[test]
fn one_submission_in_flight() {
  let mut machine = Checkout::default();
  let cart = cart_with(&[(1, 1)]).snapshot();
  machine.handle(Event::Begin { cart, customer: None }).unwrap();
  machine.handle(Event::EditAddress(address())).unwrap();

  let fx = machine.handle(Event::Submit).unwrap();
  let token = fx
    .iter()
    .find_map(|e| match e {
      Effect::CreateOrder { token, .. } => Some(*token),
      _ => None,
    })
    .unwrap();
  assert_eq!(machine.state(), &CheckoutState::Submitting);
  assert!(matches!(machine.handle(Event::Submit), Err(Error::SubmissionInFlight)));
  assert!(matches!(
    machine.handle(Event::ApplyPromo("X".into())),
    Err(Error::SubmissionInFlight)
  ));

  machine
    .handle(Event::OrderFailed { token, message: "timeout".into() })
    .unwrap();
  // The same token cannot settle twice.
  let late = OrderCreated {
    order_id:              1,
    net_amount:            Decimal::ZERO,
    order_status:          None,
    payment_status:        None,
    promo_code:            None,
    promo_discount_amount: None,
  };
  assert!(matches!(
    machine.handle(Event::OrderCreated { token, created: late }),
    Err(Error::StaleSubmission)
  ));
  assert!(matches!(machine.state(), CheckoutState::Error { .. }));
}

#[test]
fn validate_address_reaches_address_valid() {
  let mut machine = Checkout::new(CheckoutConfig {
    confirmation_delay: Duration::ZERO,
    ..CheckoutConfig::default()
  });
  let cart = cart_with(&[(1, 1)]).snapshot();
  machine.handle(Event::Begin { cart, customer: None }).unwrap();

  let fx = machine.handle(Event::ValidateAddress).unwrap();
  assert!(fx.contains(&Effect::FocusField(Field::RecipientName)));
  assert_eq!(machine.state(), &CheckoutState::AddressPending);

  machine.handle(Event::EditAddress(address())).unwrap();
  machine.handle(Event::ValidateAddress).unwrap();
  assert_eq!(machine.state(), &CheckoutState::AddressValid);

  let mut edited = address();
  edited.city = String::new();
  machine.handle(Event::EditAddress(edited)).unwrap();
  assert_eq!(machine.state(), &CheckoutState::AddressPending);
}

// ─── Orders ──────────────────────────────────────────────────────────────────

fn summary(order_id: OrderId, status: &str) -> OrderSummary {
  OrderSummary {
    order_id,
    order_ts: "2026-03-01T09:30:00".into(),
    order_status: status.into(),
    net_amount: d("535.00"),
    items: vec![OrderItem { product_id: 1, product_name: "Product 1".into(), qty: 2 }],
  }
}

#[tokio::test]
async fn timelines_fail_independently() {
  let api = FakeApi {
    orders: Mutex::new(vec![summary(1, "PLACED"), summary(2, "SHIPPED"), summary(3, "CANCELLED")]),
    broken_timelines: HashSet::from([2]),
    ..FakeApi::default()
  };
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(Some(7)).await.unwrap();

  assert_eq!(orders.orders().len(), 3);
  assert!(matches!(orders.viewer().timeline(1), Some(TimelineView::Available { .. })));
  assert_eq!(orders.viewer().timeline(2), Some(&TimelineView::Unavailable));
  match orders.viewer().timeline(3) {
    Some(TimelineView::Available { stages, .. }) => {
      let names: Vec<_> = stages.iter().map(|s| s.stage.as_str()).collect();
      assert_eq!(names, ["PLACED", "CANCELLED"]);
    }
    other => panic!("unexpected timeline {other:?}"),
  }
}

#[tokio::test]
async fn detail_survives_missing_timeline() {
  let api = FakeApi {
    orders: Mutex::new(vec![summary(4, "PLACED")]),
    broken_timelines: HashSet::from([4]),
    ..FakeApi::default()
  };
  let mut orders = OrderLifecycle::new(&api, 25);
  let (detail, view) = orders.detail(4, 7).await.unwrap();
  assert_eq!(detail.order_id, 4);
  assert_eq!(view, TimelineView::Unavailable);
}

#[tokio::test]
async fn blank_reason_never_reaches_network() {
  let api = FakeApi { orders: Mutex::new(vec![summary(1, "PLACED")]), ..FakeApi::default() };
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(Some(7)).await.unwrap();

  let err = orders.cancel(1, "  \t ").await.unwrap_err();
  assert!(matches!(err, Error::Validation { field: Field::CancellationReason, .. }));
  assert!(!api.calls().iter().any(|c| matches!(c, Call::Cancel(..))));
}

#[tokio::test]
async fn cancel_refetches_from_server() {
  let api = FakeApi { orders: Mutex::new(vec![summary(1, "PLACED")]), ..FakeApi::default() };
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(Some(7)).await.unwrap();
  assert!(orders.viewer().cancellable(1));

  orders.cancel(1, "Other: changed my mind").await.unwrap();
  assert!(api.calls().contains(&Call::Cancel(1, "Other: changed my mind".into())));
  let fetches = api.calls().iter().filter(|c| matches!(c, Call::Orders(_))).count();
  assert_eq!(fetches, 2);
  assert_eq!(orders.orders()[0].order_status, "CANCELLED");
  assert!(!orders.viewer().cancellable(1));
  assert!(orders.take_notices().iter().any(|n| n.contains("#1 cancelled")));
}

#[tokio::test]
async fn shipped_order_cannot_be_cancelled() {
  let api = FakeApi { orders: Mutex::new(vec![summary(1, "SHIPPED")]), ..FakeApi::default() };
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(Some(7)).await.unwrap();
  assert!(orders.cancel(1, "Item price too high").await.is_err());
  assert!(!api.calls().iter().any(|c| matches!(c, Call::Cancel(..))));
}

#[tokio::test]
async fn server_rejection_of_cancel_is_surfaced() {
  let api = FakeApi {
    orders: Mutex::new(vec![summary(1, "PLACED")]),
    fail_cancel: true,
    ..FakeApi::default()
  };
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(Some(7)).await.unwrap();
  let err = orders.cancel(1, "Order created by mistake").await.unwrap_err();
  assert_eq!(err.status(), Some(409));
  // The action is offered again once the failure is known.
  assert!(orders.viewer().cancellable(1));
}

#[tokio::test]
async fn guest_sees_sign_in_state() {
  let api = FakeApi::default();
  let mut orders = OrderLifecycle::new(&api, 25);
  orders.open(None).await.unwrap();
  assert_eq!(orders.viewer().list(), &crate::orders::ListState::SignInRequired);
  assert!(api.calls().is_empty());
  assert!(matches!(
    orders.cancel(1, "Other: x").await,
    Err(Error::BusinessOutcome(crate::error::Outcome::SignInRequired))
  ));
}
