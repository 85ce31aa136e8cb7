use anyhow::bail;
use clap::Args;
use globalcart_core::{
  checkout::{CheckoutState, DEFAULT_FAILURE_REASON, Effect, Event},
  driver::CheckoutRunner,
  model::{Address, AddressId, PaymentMethod},
};
use tracing::info;

use super::{Context, cart::print_totals, orders};

#[derive(Args, Debug)]
pub struct CheckoutArgs {
  /// Ship to a saved address instead of the fields below.
  #[arg(long, conflicts_with_all = ["name", "phone", "line1", "line2", "city", "state", "postal", "country", "save"])]
  saved:    Option<AddressId>,

  #[arg(long)]
  name:     Option<String>,
  /// 10 digits.
  #[arg(long)]
  phone:    Option<String>,
  #[arg(long)]
  line1:    Option<String>,
  #[arg(long)]
  line2:    Option<String>,
  #[arg(long)]
  city:     Option<String>,
  #[arg(long)]
  state:    Option<String>,
  /// 6 digits.
  #[arg(long)]
  postal:   Option<String>,
  #[arg(long)]
  country:  Option<String>,

  /// Save the entered address to the address book (signed-in only).
  #[arg(long)]
  save:     bool,

  #[arg(long)]
  promo:    Option<String>,

  /// UPI, CARD, NETBANKING or COD.
  #[arg(long, default_value = "UPI")]
  payment:  PaymentMethod,

  /// Ask the server to decline the payment, with an optional reason.
  #[arg(long, value_name = "REASON", num_args = 0..=1, default_missing_value = DEFAULT_FAILURE_REASON)]
  simulate_failure: Option<String>,
}

impl CheckoutArgs {
  fn entered_address(&self) -> Option<Address> {
    let any = [
      &self.name,
      &self.phone,
      &self.line1,
      &self.line2,
      &self.city,
      &self.state,
      &self.postal,
      &self.country,
    ]
    .iter()
    .any(|f| f.is_some());
    if !any {
      return None;
    }
    let mut a = Address::blank();
    let fields = [
      (&mut a.recipient_name, &self.name),
      (&mut a.phone, &self.phone),
      (&mut a.address_line1, &self.line1),
      (&mut a.address_line2, &self.line2),
      (&mut a.city, &self.city),
      (&mut a.state, &self.state),
      (&mut a.postal_code, &self.postal),
      (&mut a.country, &self.country),
    ];
    for (slot, value) in fields {
      if let Some(v) = value {
        slot.clone_from(v);
      }
    }
    Some(a)
  }
}

pub async fn run(ctx: &Context, args: CheckoutArgs) -> anyhow::Result<()> {
  let mut runner = CheckoutRunner::new(&ctx.api, &ctx.cart, ctx.checkout_config());
  runner.begin(ctx.customer()).await?;
  report(runner.take_ui_effects());
  if *runner.machine().state() == CheckoutState::CannotCheckout {
    bail!("your cart is empty");
  }

  if let Some(id) = args.saved {
    runner.dispatch(Event::SelectSavedAddress(id)).await?;
  } else if let Some(address) = args.entered_address() {
    runner.dispatch(Event::EditAddress(address)).await?;
  }
  if let Some(id) = runner.machine().selected_saved()
    && let Some(saved) = runner.machine().saved_addresses().iter().find(|a| a.address_id == id)
  {
    println!("Shipping to {}", saved.summary());
  }
  runner.dispatch(Event::SetSaveAddress(args.save)).await?;
  runner.dispatch(Event::SetPaymentMethod(args.payment)).await?;
  runner.dispatch(Event::SetSimulatedFailure(args.simulate_failure)).await?;

  if let Some(code) = args.promo {
    runner.dispatch(Event::ApplyPromo(code)).await?;
    report(runner.take_ui_effects());
  }
  print_totals(&runner.machine().totals());

  runner.dispatch(Event::Submit).await?;
  let navigate = report(runner.take_ui_effects());

  match runner.machine().state().clone() {
    CheckoutState::Confirmed { order_id } => {
      info!(order_id, "checkout complete");
      if let Some(after) = navigate {
        tokio::time::sleep(after).await;
        orders::list(ctx).await?;
      }
      Ok(())
    }
    CheckoutState::PaymentFailed { order_id } => {
      bail!("payment failed for order #{order_id}; your cart was kept, retry with `globalcart checkout`")
    }
    CheckoutState::Error { message } => bail!("checkout failed: {message}"),
    other => bail!("checkout did not complete ({})", other.name()),
  }
}

/// Print notices and focus hints. Returns the navigation delay, if any.
fn report(effects: Vec<Effect>) -> Option<std::time::Duration> {
  let mut navigate = None;
  for effect in effects {
    match effect {
      Effect::Notify(notice) => println!("{notice}"),
      Effect::FocusField(field) => eprintln!("  → fix --{}", flag_for(field)),
      Effect::NavigateToOrders { after } => navigate = Some(after),
      _ => {}
    }
  }
  navigate
}

fn flag_for(field: globalcart_core::error::Field) -> &'static str {
  use globalcart_core::error::Field;
  match field {
    Field::RecipientName => "name",
    Field::Phone => "phone",
    Field::AddressLine1 => "line1",
    Field::City => "city",
    Field::State => "state",
    Field::PostalCode => "postal",
    Field::Country => "country",
    Field::SavedAddress => "saved",
    Field::SaveAddress => "save",
    other => other.into(),
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Harness {
    #[command(flatten)]
    args: CheckoutArgs,
  }

  fn parse(flags: &[&str]) -> CheckoutArgs {
    Harness::parse_from(std::iter::once("checkout").chain(flags.iter().copied())).args
  }

  #[test]
  fn no_address_flags_keeps_the_preselected_address() {
    assert_eq!(parse(&["--promo", "SAVE10"]).entered_address(), None);
  }

  #[test]
  fn country_alone_is_an_address_edit() {
    let a = parse(&["--country", "Nepal"]).entered_address().unwrap();
    assert_eq!(a.country, "Nepal");
    assert_eq!(a.recipient_name, "");
  }

  #[test]
  fn line2_alone_is_an_address_edit() {
    let a = parse(&["--line2", "Flat 4"]).entered_address().unwrap();
    assert_eq!(a.address_line2, "Flat 4");
    assert_eq!(a.country, Address::DEFAULT_COUNTRY);
  }

  #[test]
  fn saved_conflicts_with_address_flags() {
    let err = Harness::try_parse_from(["checkout", "--saved", "3", "--country", "Nepal"]);
    assert!(err.is_err());
  }
}
