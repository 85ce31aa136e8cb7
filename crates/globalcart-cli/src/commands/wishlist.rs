use clap::Subcommand;
use globalcart_core::model::ProductId;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum WishlistCmd {
  List,
  Add { product_id: ProductId },
  Remove { product_id: ProductId },
}

pub async fn run(ctx: &Context, cmd: WishlistCmd) -> anyhow::Result<()> {
  match cmd {
    WishlistCmd::List => {
      let items = ctx.api.wishlist().await?;
      if items.is_empty() {
        println!("Your wishlist is empty.");
      }
      for i in items {
        let p = &i.product;
        println!("#{:<6} {:<40} ₹{}  (added {})", p.product_id, p.product_name, p.sell_price, i.added_at);
      }
    }
    WishlistCmd::Add { product_id } => {
      ctx.api.wishlist_add(product_id).await?;
      println!("Added #{product_id} to your wishlist.");
    }
    WishlistCmd::Remove { product_id } => {
      ctx.api.wishlist_remove(product_id).await?;
      println!("Removed #{product_id} from your wishlist.");
    }
  }
  Ok(())
}
