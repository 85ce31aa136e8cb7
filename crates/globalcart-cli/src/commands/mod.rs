//! Subcommands. Each module owns its clap types and a `run` function.

mod account;
mod addresses;
mod admin;
mod cart;
mod checkout;
mod orders;
mod products;
mod reviews;
mod wishlist;

use std::sync::Arc;

use anyhow::{Context as _, bail};
use clap::Subcommand;
use globalcart_client::{ApiClient, ApiConfig};
use globalcart_core::{
  cart::CartEngine,
  checkout::CheckoutConfig,
  model::Customer,
  storage::Persistence,
};
use globalcart_store_sqlite::SqliteStore;
use tracing::debug;

use crate::config::ClientConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Browse the catalog.
  #[command(subcommand)]
  Products(products::ProductsCmd),
  /// Inspect and edit the local cart.
  #[command(subcommand)]
  Cart(cart::CartCmd),
  /// Place an order for everything in the cart.
  Checkout(checkout::CheckoutArgs),
  /// Order history, tracking and cancellation.
  #[command(subcommand)]
  Orders(orders::OrdersCmd),
  /// Sign in, sign up and sign out.
  #[command(subcommand)]
  Account(account::AccountCmd),
  /// Manage saved shipping addresses.
  #[command(subcommand)]
  Addresses(addresses::AddressesCmd),
  #[command(subcommand)]
  Wishlist(wishlist::WishlistCmd),
  /// Read and write product reviews.
  #[command(subcommand)]
  Reviews(reviews::ReviewsCmd),
  /// Admin reporting console.
  #[command(subcommand)]
  Admin(admin::AdminCmd),
}

pub async fn run(ctx: &Context, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Products(cmd) => products::run(ctx, cmd).await,
    Command::Cart(cmd) => cart::run(ctx, cmd).await,
    Command::Checkout(args) => checkout::run(ctx, args).await,
    Command::Orders(cmd) => orders::run(ctx, cmd).await,
    Command::Account(cmd) => account::run(ctx, cmd).await,
    Command::Addresses(cmd) => addresses::run(ctx, cmd).await,
    Command::Wishlist(cmd) => wishlist::run(ctx, cmd).await,
    Command::Reviews(cmd) => reviews::run(ctx, cmd).await,
    Command::Admin(cmd) => admin::run(ctx, cmd).await,
  }
}

// ─── Shared context ───────────────────────────────────────────────────────────

/// Everything a subcommand needs: the API client, the cart and settings.
pub struct Context {
  pub config: ClientConfig,
  pub api:    ApiClient,
  pub cart:   CartEngine,
}

impl Context {
  pub fn open(config: ClientConfig) -> anyhow::Result<Self> {
    let store_path = config.resolved_store_path();
    let store = SqliteStore::open(&store_path)
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    debug!(path = %store_path.display(), "local store opened");
    let persistence = Arc::new(Persistence::new(Arc::new(store)));

    let api = ApiClient::new(
      ApiConfig {
        base_url: config.api_base_url.clone(),
        timeout: config.request_timeout(),
        channel: config.channel.clone(),
        ..ApiConfig::default()
      },
      persistence.clone(),
    )?;
    let cart = CartEngine::new(persistence);

    Ok(Self { config, api, cart })
  }

  pub fn customer(&self) -> Option<Customer> { self.api.persistence().customer() }

  pub fn require_customer(&self) -> anyhow::Result<Customer> {
    match self.customer() {
      Some(c) => Ok(c),
      None => bail!("sign in required: run `globalcart account login` first"),
    }
  }

  pub fn checkout_config(&self) -> CheckoutConfig {
    CheckoutConfig {
      channel:            self.config.channel.clone(),
      currency:           self.config.currency.clone(),
      confirmation_delay: self.config.confirmation_delay(),
    }
  }
}

/// Read a secret from stdin when it was not given on the command line.
pub fn prompt_secret(label: &str, given: Option<String>) -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  if let Some(v) = given {
    return Ok(v);
  }
  eprint!("{label}: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
}
