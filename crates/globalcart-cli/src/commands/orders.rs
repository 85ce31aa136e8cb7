use anyhow::bail;
use clap::Subcommand;
use globalcart_core::{
  driver::OrderLifecycle,
  model::{OrderId, OrderItem},
  orders::{
    CancellationReason, DEFAULT_ORDER_LIMIT, ListState, OrderViewer, REASON_PRESETS, TimelineView,
  },
};

use super::Context;

#[derive(Subcommand, Debug)]
pub enum OrdersCmd {
  /// Recent orders with their progress.
  List {
    #[arg(long, default_value_t = DEFAULT_ORDER_LIMIT)]
    limit: u32,
  },
  /// One order in detail.
  Show { order_id: OrderId },
  /// Cancel an order that has not shipped yet.
  Cancel {
    order_id: OrderId,
    /// One of the presets listed by `orders reasons`.
    #[arg(long)]
    reason:   String,
    /// Free text, required when the reason is `Other`.
    #[arg(long)]
    other:    Option<String>,
  },
  /// Put every item of a past order back in the cart.
  Reorder { order_id: OrderId },
  /// List the cancellation reason presets.
  Reasons,
}

pub async fn run(ctx: &Context, cmd: OrdersCmd) -> anyhow::Result<()> {
  match cmd {
    OrdersCmd::List { limit } => list_with_limit(ctx, limit).await,

    OrdersCmd::Show { order_id } => {
      let customer = ctx.require_customer()?;
      let mut lifecycle = OrderLifecycle::new(&ctx.api, DEFAULT_ORDER_LIMIT);
      let (detail, timeline) = lifecycle.detail(order_id, customer.customer_id).await?;
      println!("Order #{} · {} · {}", detail.order_id, detail.order_status, detail.order_ts);
      if let Some(p) = detail.payment_status.as_deref() {
        println!("  Payment: {p}");
      }
      print_items(&detail.items);
      println!("  Gross     ₹{}", detail.gross_amount);
      println!("  Discount -₹{}", detail.discount_amount);
      if let (Some(code), Some(amount)) = (&detail.promo_code, detail.promo_discount_amount) {
        println!("  Promo {code} -₹{amount}");
      }
      println!("  Tax       ₹{}", detail.tax_amount);
      println!("  Net       ₹{}", detail.net_amount);
      print_timeline(&timeline);
      if lifecycle.viewer().cancellable(order_id) {
        println!("  Cancel with: globalcart orders cancel {order_id} --reason <REASON>");
      }
      Ok(())
    }

    OrdersCmd::Cancel { order_id, reason, other } => {
      let customer = ctx.require_customer()?;
      let reason = CancellationReason::from_preset(&reason, other.as_deref())?;
      let mut lifecycle = OrderLifecycle::new(&ctx.api, DEFAULT_ORDER_LIMIT);
      // The status check runs against the freshest list, not a cached one.
      lifecycle.open(Some(customer.customer_id)).await?;
      let result = lifecycle.cancel(order_id, reason.as_str()).await;
      for notice in lifecycle.take_notices() {
        println!("{notice}");
      }
      result?;
      print_list(lifecycle.viewer());
      Ok(())
    }

    OrdersCmd::Reorder { order_id } => {
      let customer = ctx.require_customer()?;
      let detail = ctx.api.order_detail(order_id, customer.customer_id).await?;
      if detail.items.is_empty() {
        bail!("order #{order_id} has no items to reorder");
      }
      let cart = ctx
        .cart
        .add_items(detail.items.iter().map(|i| (i.product_id, i64::from(i.qty))));
      println!(
        "Added {} item(s) from order #{order_id}; cart now holds {}.",
        detail.items.len(),
        cart.count()
      );
      Ok(())
    }

    OrdersCmd::Reasons => {
      for r in REASON_PRESETS {
        println!("{r}");
      }
      Ok(())
    }
  }
}

pub async fn list(ctx: &Context) -> anyhow::Result<()> {
  list_with_limit(ctx, DEFAULT_ORDER_LIMIT).await
}

async fn list_with_limit(ctx: &Context, limit: u32) -> anyhow::Result<()> {
  let mut lifecycle = OrderLifecycle::new(&ctx.api, limit);
  lifecycle
    .open(ctx.customer().map(|c| c.customer_id))
    .await?;
  print_list(lifecycle.viewer());
  if let ListState::Failed(message) = lifecycle.viewer().list() {
    bail!("could not load orders: {message}");
  }
  Ok(())
}

fn print_list(viewer: &OrderViewer) {
  match viewer.list() {
    ListState::SignInRequired => println!("Sign in to see your orders."),
    ListState::Loading => println!("Loading…"),
    ListState::Empty => println!("No orders yet."),
    ListState::Failed(_) => {}
    ListState::Loaded(orders) => {
      for o in orders {
        println!("#{} · {} · {} · ₹{}", o.order_id, o.order_status, o.order_ts, o.net_amount);
        print_items(&o.items);
        if let Some(view) = viewer.timeline(o.order_id) {
          print_timeline(view);
        }
      }
    }
  }
}

fn print_items(items: &[OrderItem]) {
  for i in items {
    println!("    {} × {} (#{})", i.qty, i.product_name, i.product_id);
  }
}

fn print_timeline(view: &TimelineView) {
  match view {
    TimelineView::Unavailable => println!("  Timeline unavailable"),
    TimelineView::Available { stages, cancellation_reason } => {
      let line: Vec<String> = stages
        .iter()
        .map(|s| match &s.timestamp {
          Some(ts) => format!("{} ✓ {ts}", s.stage),
          None => format!("{} …", s.stage),
        })
        .collect();
      println!("  {}", line.join("  →  "));
      if let Some(reason) = cancellation_reason {
        println!("  Cancelled: {reason}");
      }
    }
  }
}
