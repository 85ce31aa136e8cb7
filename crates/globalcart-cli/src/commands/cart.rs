use std::collections::BTreeMap;

use clap::Subcommand;
use futures::future::join_all;
use globalcart_core::{
  cart::Cart,
  model::{FunnelStage, FunnelStep, ProductId},
  money::Totals,
};
use rust_decimal::Decimal;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum CartCmd {
  /// Show cart lines with prices and totals.
  Show,
  /// Add a product; an existing line is incremented (capped at 20).
  Add {
    product_id: ProductId,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    qty:        i64,
  },
  Remove { product_id: ProductId },
  /// Set a line's quantity, clamped to 1..=20. Absent lines are left alone.
  Set {
    product_id: ProductId,
    #[arg(allow_negative_numbers = true)]
    qty:        i64,
  },
  Clear,
}

pub async fn run(ctx: &Context, cmd: CartCmd) -> anyhow::Result<()> {
  match cmd {
    CartCmd::Show => {
      ctx.api.track(FunnelStep::new(FunnelStage::ViewCart)).await;
      show(ctx, &ctx.cart.snapshot()).await;
    }
    CartCmd::Add { product_id, qty } => {
      // Fail before touching the cart if the product does not exist.
      let detail = ctx.api.product(product_id).await?;
      let cart = ctx.cart.add_item(product_id, qty);
      ctx
        .api
        .track(FunnelStep::new(FunnelStage::AddToCart).with_product(product_id))
        .await;
      println!(
        "Added {} (now {} in cart, {} item(s) total).",
        detail.product.product_name,
        cart.qty_of(product_id).unwrap_or_default(),
        cart.count()
      );
    }
    CartCmd::Remove { product_id } => {
      let cart = ctx.cart.remove_item(product_id);
      println!("{} item(s) in cart.", cart.count());
    }
    CartCmd::Set { product_id, qty } => {
      let cart = ctx.cart.set_qty(product_id, qty);
      match cart.qty_of(product_id) {
        Some(q) => println!("Quantity for #{product_id} is now {q}."),
        None => println!("#{product_id} is not in the cart."),
      }
    }
    CartCmd::Clear => {
      ctx.cart.clear();
      println!("Cart cleared.");
    }
  }
  Ok(())
}

async fn show(ctx: &Context, cart: &Cart) {
  if cart.is_empty() {
    println!("Your cart is empty.");
    return;
  }

  let ids: Vec<ProductId> = cart.items.iter().map(|l| l.product_id).collect();
  let details = join_all(ids.iter().map(|id| ctx.api.product(*id))).await;
  let mut names = BTreeMap::new();
  let mut prices = BTreeMap::new();
  for (id, detail) in ids.into_iter().zip(details) {
    if let Ok(detail) = detail {
      prices.insert(id, detail.product.sell_price);
      names.insert(id, detail.product.product_name);
    }
  }

  for line in &cart.items {
    let name = names.get(&line.product_id).map_or("(unavailable)", String::as_str);
    match prices.get(&line.product_id) {
      Some(price) => println!(
        "#{:<6} {:<40} {:>2} × ₹{price} = ₹{}",
        line.product_id,
        name,
        line.qty,
        *price * Decimal::from(line.qty)
      ),
      None => println!("#{:<6} {:<40} {:>2}", line.product_id, name, line.qty),
    }
  }
  print_totals(&Totals::compute(&cart.items, &prices, Decimal::ZERO));
}

pub fn print_totals(t: &Totals) {
  println!("  Subtotal  ₹{}", t.subtotal);
  println!("  Tax (7%)  ₹{}", t.tax);
  if !t.discount.is_zero() {
    println!("  Total     ₹{}", t.pre_promo_total);
    println!("  Promo    -₹{}", t.discount);
  }
  println!("  Payable   ₹{}", t.payable);
}
