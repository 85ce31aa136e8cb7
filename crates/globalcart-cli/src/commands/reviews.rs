use clap::Subcommand;
use globalcart_client::catalog::NewReview;
use globalcart_core::model::ProductId;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum ReviewsCmd {
  List {
    product_id: ProductId,
    #[arg(long, default_value_t = 10)]
    limit:      u32,
    #[arg(long, default_value_t = 0)]
    offset:     u32,
  },
  /// Whether you may review a product.
  Eligibility { product_id: ProductId },
  /// Write or replace your review.
  Post {
    product_id: ProductId,
    /// 1 to 5.
    #[arg(long)]
    rating:     u8,
    #[arg(long)]
    title:      Option<String>,
    #[arg(long)]
    body:       Option<String>,
  },
}

pub async fn run(ctx: &Context, cmd: ReviewsCmd) -> anyhow::Result<()> {
  match cmd {
    ReviewsCmd::List { product_id, limit, offset } => {
      let reviews = ctx.api.reviews(product_id, limit, offset).await?;
      if reviews.is_empty() {
        println!("No reviews yet.");
      }
      for r in reviews {
        let stars = "★".repeat(usize::from(r.rating));
        println!("{stars:<5} {} ({})", r.title.as_deref().unwrap_or(""), r.created_at);
        if let Some(body) = r.body.as_deref() {
          println!("      {body}");
        }
      }
    }
    ReviewsCmd::Eligibility { product_id } => {
      let customer = ctx.require_customer()?;
      let e = ctx.api.review_eligibility(product_id, customer.customer_id).await?;
      match (e.eligible, e.reason) {
        (true, _) => println!("You can review this product."),
        (false, Some(reason)) => println!("Not eligible: {reason}"),
        (false, None) => println!("Not eligible."),
      }
    }
    ReviewsCmd::Post { product_id, rating, title, body } => {
      let customer = ctx.require_customer()?;
      let review = NewReview { rating, title, body };
      let saved = ctx.api.post_review(product_id, customer.customer_id, &review).await?;
      println!("Review #{} saved.", saved.review_id);
    }
  }
  Ok(())
}
