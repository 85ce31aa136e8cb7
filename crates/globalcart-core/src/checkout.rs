//! The checkout orchestrator as a pure state machine.
//!
//! [`Checkout::handle`] consumes one [`Event`] and returns the [`Effect`]s the
//! caller must perform. Nothing in here touches the network or storage; the
//! async [`CheckoutRunner`](crate::driver::CheckoutRunner) executes IO effects
//! and feeds their results back in as events.
//!
//! ```text
//! Draft ─Begin─▶ AddressPending ⇄ AddressValid ─Submit─▶ Submitting
//!   │                                                      │
//!   └─(empty cart)─▶ CannotCheckout       Confirmed ◀──────┼──▶ PaymentFailed
//!                                                          └──▶ Error
//! ```
//!
//! At most one order submission is in flight at a time. The machine owns a
//! single [`SubmissionToken`] slot; results that carry any other token are
//! rejected with [`Error::StaleSubmission`].

use std::{collections::BTreeMap, fmt, time::Duration};

use rust_decimal::Decimal;
use strum::IntoStaticStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  cart::Cart,
  error::{Error, Field, Result, Rule},
  model::{
    Address, AddressId, AppliedPromo, CreateOrderRequest, Customer, CustomerId, FunnelStage,
    FunnelStep, NewAddress, OrderCreated, OrderId, PaymentMethod, ProductDetail, ProductId,
    PromoValidation, SavedAddress,
  },
  money::Totals,
  validate,
};

pub const DEFAULT_FAILURE_REASON: &str = "BANK_DECLINED";
pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_millis(5800);

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
  pub channel:            String,
  pub currency:           String,
  /// How long the confirmation stays up before navigating to the orders list.
  pub confirmation_delay: Duration,
}

impl Default for CheckoutConfig {
  fn default() -> Self {
    Self {
      channel:            "WEB".to_owned(),
      currency:           "INR".to_owned(),
      confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
    }
  }
}

// ─── States, events, effects ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CheckoutState {
  Draft,
  /// Terminal: the cart was empty when checkout began.
  CannotCheckout,
  AddressPending,
  AddressValid,
  Submitting,
  Confirmed { order_id: OrderId },
  PaymentFailed { order_id: OrderId },
  Error { message: String },
}

impl CheckoutState {
  pub fn name(&self) -> &'static str { self.into() }

  /// States in which the form can still be edited and submitted.
  fn is_open(&self) -> bool {
    matches!(
      self,
      Self::AddressPending | Self::AddressValid | Self::Error { .. } | Self::PaymentFailed { .. }
    )
  }
}

/// Identifies one order submission. Issued on `Submit`, released when the
/// submission reaches an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionToken(Uuid);

impl SubmissionToken {
  fn issue() -> Self { Self(Uuid::new_v4()) }
}

#[derive(Debug, Clone)]
pub enum Event {
  Begin { cart: Cart, customer: Option<Customer> },
  ProductLoaded(ProductDetail),
  ProductFailed { product_id: ProductId, message: String },
  SavedAddressesLoaded(Vec<SavedAddress>),

  SelectSavedAddress(AddressId),
  ClearSavedAddress,
  EditAddress(Address),
  SetSaveAddress(bool),
  SetPaymentMethod(PaymentMethod),
  /// Ask the server to decline the payment. `None` disables the simulation.
  SetSimulatedFailure(Option<String>),
  /// Validate the address form without submitting.
  ValidateAddress,

  ApplyPromo(String),
  PromoValidated { code: String, result: PromoValidation },
  PromoFailed { code: String, message: String },

  Submit,
  AddressSaved { token: SubmissionToken, address: SavedAddress },
  AddressSaveFailed { token: SubmissionToken, message: String },
  OrderCreated { token: SubmissionToken, created: OrderCreated },
  OrderFailed { token: SubmissionToken, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  FetchProducts(Vec<ProductId>),
  LoadSavedAddresses(CustomerId),
  ValidatePromo { code: String, amount: Decimal },
  SaveAddress {
    token:       SubmissionToken,
    customer_id: CustomerId,
    address:     NewAddress,
  },
  CreateOrder { token: SubmissionToken, request: CreateOrderRequest },
  ClearCart,
  Track(FunnelStep),
  Notify(Notice),
  FocusField(Field),
  NavigateToOrders { after: Duration },
}

/// Something the operator should be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  CartEmpty,
  EnterPromoCode,
  PromoApplied { code: String, discount: Decimal },
  PromoRejected(String),
  InvalidField { field: Field, rule: Rule },
  SignInToSaveAddress,
  AddressSaved,
  AddressSaveFailed(String),
  OrderConfirmed { order_id: OrderId },
  PaymentFailed { order_id: OrderId },
  CheckoutFailed(String),
}

impl fmt::Display for Notice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CartEmpty => f.write_str("Your cart is empty."),
      Self::EnterPromoCode => f.write_str("Enter a promo code."),
      Self::PromoApplied { code, discount } => write!(f, "Applied {code} (-{discount})"),
      Self::PromoRejected(msg) => f.write_str(msg),
      Self::InvalidField { field, rule } => write!(f, "Check {field}: {rule}"),
      Self::SignInToSaveAddress => f.write_str("Please sign in to save addresses."),
      Self::AddressSaved => f.write_str("Your address has been saved for future orders."),
      Self::AddressSaveFailed(msg) => write!(f, "Failed to save address: {msg}"),
      Self::OrderConfirmed { order_id } => write!(f, "Order #{order_id} confirmed"),
      Self::PaymentFailed { order_id } => write!(f, "Payment failed. Order #{order_id} marked as failed."),
      Self::CheckoutFailed(msg) => write!(f, "Checkout failed: {msg}"),
    }
  }
}

// ─── Machine ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Checkout {
  config:          CheckoutConfig,
  state:           CheckoutState,
  cart:            Cart,
  customer:        Option<Customer>,
  prices:          BTreeMap<ProductId, Decimal>,
  products:        BTreeMap<ProductId, ProductDetail>,
  saved_addresses: Vec<SavedAddress>,
  selected_saved:  Option<AddressId>,
  draft:           Address,
  save_address:    bool,
  promo:           Option<AppliedPromo>,
  pending_promo:   Option<String>,
  payment_method:  PaymentMethod,
  simulate:        Option<String>,
  in_flight:       Option<InFlight>,
}

#[derive(Debug, Clone)]
struct InFlight {
  token:   SubmissionToken,
  request: CreateOrderRequest,
}

impl Checkout {
  pub fn new(config: CheckoutConfig) -> Self {
    Self {
      config,
      state: CheckoutState::Draft,
      cart: Cart::default(),
      customer: None,
      prices: BTreeMap::new(),
      products: BTreeMap::new(),
      saved_addresses: Vec::new(),
      selected_saved: None,
      draft: Address::blank(),
      save_address: false,
      promo: None,
      pending_promo: None,
      payment_method: PaymentMethod::default(),
      simulate: None,
      in_flight: None,
    }
  }

  // ── Read access ───────────────────────────────────────────────────────

  pub fn state(&self) -> &CheckoutState { &self.state }

  pub fn cart(&self) -> &Cart { &self.cart }

  pub fn customer(&self) -> Option<&Customer> { self.customer.as_ref() }

  pub fn draft(&self) -> &Address { &self.draft }

  pub fn product(&self, id: ProductId) -> Option<&ProductDetail> { self.products.get(&id) }

  pub fn saved_addresses(&self) -> &[SavedAddress] { &self.saved_addresses }

  pub fn selected_saved(&self) -> Option<AddressId> { self.selected_saved }

  pub fn promo(&self) -> Option<&AppliedPromo> { self.promo.as_ref() }

  pub fn payment_method(&self) -> PaymentMethod { self.payment_method }

  pub fn submission_in_flight(&self) -> bool { self.in_flight.is_some() }

  pub fn totals(&self) -> Totals {
    let discount = self.promo.as_ref().map_or(Decimal::ZERO, |p| p.discount_amount);
    Totals::compute(&self.cart.items, &self.prices, discount)
  }

  // ── Transitions ───────────────────────────────────────────────────────

  pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>> {
    match event {
      Event::Begin { cart, customer } => self.begin(cart, customer),

      Event::ProductLoaded(detail) => {
        self.prices.insert(detail.product.product_id, detail.product.sell_price);
        self.products.insert(detail.product.product_id, detail);
        Ok(vec![])
      }
      Event::ProductFailed { product_id, message } => {
        debug!(product_id, %message, "price unavailable for cart line");
        Ok(vec![])
      }
      Event::SavedAddressesLoaded(list) => {
        self.saved_addresses = list;
        if self.selected_saved.is_none() {
          let default = self.saved_addresses.iter().find(|a| a.is_default);
          if let Some(id) = default.map(|a| a.address_id) {
            self.select_saved(id)?;
          }
        }
        Ok(vec![])
      }

      Event::SelectSavedAddress(id) => {
        self.require_open("select an address")?;
        self.select_saved(id)?;
        Ok(vec![])
      }
      Event::ClearSavedAddress => {
        self.require_open("clear the address")?;
        self.selected_saved = None;
        self.draft = Address::blank();
        self.touch_address();
        Ok(vec![])
      }
      Event::EditAddress(address) => {
        self.require_open("edit the address")?;
        self.selected_saved = None;
        self.draft = address;
        self.touch_address();
        Ok(vec![])
      }
      Event::SetSaveAddress(save) => {
        self.require_open("change address saving")?;
        self.save_address = save;
        Ok(vec![])
      }
      Event::SetPaymentMethod(method) => {
        self.require_open("change the payment method")?;
        self.payment_method = method;
        Ok(vec![])
      }
      Event::SetSimulatedFailure(reason) => {
        self.require_open("change the payment simulation")?;
        self.simulate = reason;
        Ok(vec![])
      }
      Event::ValidateAddress => {
        self.require_open("validate the address")?;
        Ok(match self.check_address() {
          Ok(()) => {
            self.state = CheckoutState::AddressValid;
            vec![]
          }
          Err((field, rule)) => self.invalid(field, rule),
        })
      }

      Event::ApplyPromo(code) => self.apply_promo(code),
      Event::PromoValidated { code, result } => Ok(self.promo_validated(code, result)),
      Event::PromoFailed { code, message } => {
        if self.pending_promo.as_deref() != Some(code.as_str()) {
          return Ok(vec![]);
        }
        self.pending_promo = None;
        self.promo = None;
        Ok(vec![Effect::Notify(Notice::PromoRejected(message))])
      }

      Event::Submit => self.submit(),
      Event::AddressSaved { token, address } => self.address_saved(token, address),
      Event::AddressSaveFailed { token, message } => {
        self.settle(token)?;
        self.state = CheckoutState::Error { message: message.clone() };
        Ok(vec![Effect::Notify(Notice::AddressSaveFailed(message))])
      }
      Event::OrderCreated { token, created } => self.order_created(token, created),
      Event::OrderFailed { token, message } => {
        self.settle(token)?;
        info!(%message, "order submission failed");
        self.state = CheckoutState::Error { message: message.clone() };
        Ok(vec![Effect::Notify(Notice::CheckoutFailed(message))])
      }
    }
  }

  fn begin(&mut self, cart: Cart, customer: Option<Customer>) -> Result<Vec<Effect>> {
    if self.in_flight.is_some() {
      return Err(Error::SubmissionInFlight);
    }
    *self = Self::new(self.config.clone());
    if cart.is_empty() {
      self.state = CheckoutState::CannotCheckout;
      return Ok(vec![Effect::Notify(Notice::CartEmpty)]);
    }

    let mut effects = vec![
      Effect::Track(FunnelStep::new(FunnelStage::CheckoutStarted)),
      Effect::FetchProducts(cart.items.iter().map(|l| l.product_id).collect()),
    ];
    if let Some(c) = &customer {
      effects.push(Effect::LoadSavedAddresses(c.customer_id));
    }
    self.cart = cart;
    self.customer = customer;
    self.state = CheckoutState::AddressPending;
    info!(lines = self.cart.items.len(), "checkout started");
    Ok(effects)
  }

  fn require_open(&self, action: &'static str) -> Result<()> {
    if self.in_flight.is_some() {
      return Err(Error::SubmissionInFlight);
    }
    if !self.state.is_open() {
      return Err(Error::InvalidTransition { action, state: self.state.name() });
    }
    Ok(())
  }

  fn select_saved(&mut self, id: AddressId) -> Result<()> {
    let saved = self
      .saved_addresses
      .iter()
      .find(|a| a.address_id == id)
      .ok_or_else(|| Error::validation(Field::SavedAddress, Rule::Unknown))?;
    self.draft = saved.to_address();
    self.selected_saved = Some(id);
    self.save_address = false;
    self.touch_address();
    Ok(())
  }

  // Any edit invalidates a previously validated form.
  fn touch_address(&mut self) {
    if self.state == CheckoutState::AddressValid {
      self.state = CheckoutState::AddressPending;
    }
  }

  /// Saved addresses were validated when they were saved.
  fn check_address(&self) -> std::result::Result<(), (Field, Rule)> {
    if self.selected_saved.is_some() {
      return Ok(());
    }
    match validate::address(&self.draft) {
      Ok(()) => Ok(()),
      Err(Error::Validation { field, rule }) => Err((field, rule)),
      Err(_) => Err((Field::RecipientName, Rule::Required)),
    }
  }

  fn invalid(&mut self, field: Field, rule: Rule) -> Vec<Effect> {
    self.state = CheckoutState::AddressPending;
    vec![
      Effect::FocusField(field),
      Effect::Notify(Notice::InvalidField { field, rule }),
    ]
  }

  // ── Promo ─────────────────────────────────────────────────────────────

  fn apply_promo(&mut self, code: String) -> Result<Vec<Effect>> {
    self.require_open("apply a promo code")?;
    let code = code.trim().to_owned();
    if code.is_empty() {
      return Ok(vec![Effect::Notify(Notice::EnterPromoCode)]);
    }
    self.pending_promo = Some(code.clone());
    let amount = self.totals().pre_promo_total;
    Ok(vec![Effect::ValidatePromo { code, amount }])
  }

  fn promo_validated(&mut self, code: String, result: PromoValidation) -> Vec<Effect> {
    // A newer code was entered while this one was being checked.
    if self.pending_promo.as_deref() != Some(code.as_str()) {
      return vec![];
    }
    self.pending_promo = None;
    if result.valid {
      let applied = AppliedPromo {
        code:            result.code.filter(|c| !c.is_empty()).unwrap_or(code).to_uppercase(),
        discount_amount: result.discount_amount.unwrap_or_default(),
      };
      let notice = Notice::PromoApplied {
        code:     applied.code.clone(),
        discount: applied.discount_amount,
      };
      self.promo = Some(applied);
      vec![Effect::Notify(notice)]
    } else {
      self.promo = None;
      let message = result
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Invalid promo code.".to_owned());
      vec![Effect::Notify(Notice::PromoRejected(message))]
    }
  }

  // ── Submission ────────────────────────────────────────────────────────

  fn submit(&mut self) -> Result<Vec<Effect>> {
    self.require_open("submit")?;
    if self.cart.is_empty() {
      return Err(crate::error::Outcome::CartEmpty.into());
    }

    let mut effects = vec![Effect::Track(FunnelStep::new(FunnelStage::PaymentAttempted))];

    if let Err((field, rule)) = self.check_address() {
      effects.extend(self.invalid(field, rule));
      return Ok(effects);
    }

    let wants_save = self.save_address && self.selected_saved.is_none();
    let customer_id = self.customer.as_ref().map(|c| c.customer_id);
    if wants_save && customer_id.is_none() {
      self.state = CheckoutState::AddressPending;
      effects.push(Effect::FocusField(Field::SaveAddress));
      effects.push(Effect::Notify(Notice::SignInToSaveAddress));
      return Ok(effects);
    }

    self.state = CheckoutState::AddressValid;
    let token = SubmissionToken::issue();
    let request = self.build_request(customer_id);
    self.in_flight = Some(InFlight { token, request: request.clone() });
    self.state = CheckoutState::Submitting;

    match customer_id {
      Some(customer_id) if wants_save => {
        effects.push(Effect::SaveAddress {
          token,
          customer_id,
          address: NewAddress {
            label:      None,
            address:    self.draft.trimmed(),
            is_default: self.saved_addresses.is_empty(),
          },
        });
      }
      _ => effects.push(Effect::CreateOrder { token, request }),
    }
    info!(method = %self.payment_method, "submitting order");
    Ok(effects)
  }

  fn build_request(&self, customer_id: Option<CustomerId>) -> CreateOrderRequest {
    let failure_reason = self.simulate.as_ref().map(|r| {
      let r = r.trim();
      if r.is_empty() { DEFAULT_FAILURE_REASON.to_owned() } else { r.to_owned() }
    });
    CreateOrderRequest {
      items: self.cart.items.clone(),
      channel: self.config.channel.clone(),
      currency: self.config.currency.clone(),
      customer_id,
      promo_code: self.promo.as_ref().map(|p| p.code.clone()),
      payment_method: self.payment_method,
      simulate_payment_failure: self.simulate.is_some(),
      failure_reason,
      address: Some(self.draft.trimmed()),
    }
  }

  /// Release the in-flight slot if `token` owns it.
  fn settle(&mut self, token: SubmissionToken) -> Result<InFlight> {
    match self.in_flight.take() {
      Some(f) if f.token == token => Ok(f),
      other => {
        self.in_flight = other;
        Err(Error::StaleSubmission)
      }
    }
  }

  fn address_saved(
    &mut self,
    token: SubmissionToken,
    address: SavedAddress,
  ) -> Result<Vec<Effect>> {
    let request = match &self.in_flight {
      Some(f) if f.token == token => f.request.clone(),
      _ => return Err(Error::StaleSubmission),
    };
    self.selected_saved = Some(address.address_id);
    self.save_address = false;
    self.saved_addresses.push(address);
    Ok(vec![
      Effect::Notify(Notice::AddressSaved),
      Effect::CreateOrder { token, request },
    ])
  }

  fn order_created(
    &mut self,
    token: SubmissionToken,
    created: OrderCreated,
  ) -> Result<Vec<Effect>> {
    let flight = self.settle(token)?;
    let order_id = created.order_id;

    if created.payment_failed() {
      info!(order_id, "payment failed; cart kept");
      self.state = CheckoutState::PaymentFailed { order_id };
      return Ok(vec![
        Effect::Notify(Notice::PaymentFailed { order_id }),
        Effect::Track(
          FunnelStep::new(FunnelStage::PaymentFailed)
            .with_order(order_id)
            .with_failure_reason(flight.request.failure_reason),
        ),
      ]);
    }

    info!(order_id, "order confirmed");
    self.state = CheckoutState::Confirmed { order_id };
    self.cart = Cart::default();
    Ok(vec![
      Effect::Notify(Notice::OrderConfirmed { order_id }),
      Effect::Track(FunnelStep::new(FunnelStage::OrderPlaced).with_order(order_id)),
      Effect::ClearCart,
      Effect::NavigateToOrders { after: self.config.confirmation_delay },
    ])
  }
}

impl Default for Checkout {
  fn default() -> Self { Self::new(CheckoutConfig::default()) }
}
