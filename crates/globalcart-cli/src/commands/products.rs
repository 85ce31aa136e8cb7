use clap::Subcommand;
use globalcart_client::catalog::{ProductQuery, Sort};
use globalcart_core::model::{FunnelStage, FunnelStep, ProductId};

use super::Context;

#[derive(Subcommand, Debug)]
pub enum ProductsCmd {
  /// List products, optionally filtered by category.
  List {
    #[arg(long, default_value_t = 24)]
    limit:       u32,
    #[arg(long, default_value_t = 0)]
    offset:      u32,
    #[arg(long)]
    category:    Option<String>,
    #[arg(long)]
    subcategory: Option<String>,
    /// default, price_asc, price_desc or best_sellers.
    #[arg(long, default_value = "default")]
    sort:        Sort,
  },
  /// Show one product with its rating summary.
  Show { product_id: ProductId },
}

pub async fn run(ctx: &Context, cmd: ProductsCmd) -> anyhow::Result<()> {
  match cmd {
    ProductsCmd::List { limit, offset, category, subcategory, sort } => {
      let query = ProductQuery { limit, offset, category_l1: category, category_l2: subcategory, sort };
      // The page and the wishlist marks load side by side.
      let (products, wished) = tokio::join!(ctx.api.products(&query), ctx.api.wishlist_ids());
      let products = products?;
      if products.is_empty() {
        println!("No products match.");
      }
      for p in products {
        let heart = if wished.contains(&p.product_id) { " ♥" } else { "" };
        println!(
          "#{:<6} {:<40} ₹{:>10}  ({}% off ₹{}){heart}",
          p.product_id, p.product_name, p.sell_price, p.discount_pct, p.list_price
        );
      }
    }

    ProductsCmd::Show { product_id } => {
      let detail = ctx.api.product(product_id).await?;
      ctx
        .api
        .track(FunnelStep::new(FunnelStage::ViewProduct).with_product(product_id))
        .await;
      let p = &detail.product;
      println!("{} (#{})", p.product_name, p.product_id);
      println!("  {} › {} · {}", p.category_l1, p.category_l2, p.brand);
      println!("  ₹{} (list ₹{}, {}% off)", p.sell_price, p.list_price, p.discount_pct);
      if detail.in_stock {
        println!("  In stock ({})", detail.stock_qty);
      } else {
        println!("  Out of stock");
      }
      match ctx.api.rating(product_id).await {
        Some(r) if r.rating_count > 0 => {
          println!("  Rated {} from {} review(s)", r.average_rating.round_dp(1), r.rating_count)
        }
        _ => println!("  No ratings yet"),
      }
      if !detail.description.is_empty() {
        println!("\n{}", detail.description);
      }
    }
  }
  Ok(())
}

