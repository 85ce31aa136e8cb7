use std::path::PathBuf;

use anyhow::Context as _;
use clap::Subcommand;
use globalcart_client::{
  AdminClient,
  admin::{ChartParams, Page},
};
use globalcart_core::{
  model::{CustomerId, ProductId},
  storage::Durability,
};

use super::{Context, prompt_secret};

#[derive(Subcommand, Debug)]
pub enum AdminCmd {
  Login {
    username: String,
    #[arg(long, env = "GLOBALCART_ADMIN_PASSWORD")]
    password: Option<String>,
  },
  Logout,
  /// Latest KPI snapshot.
  Kpis,
  /// Funnel summary, product leakage and payment failures.
  Funnel {
    #[arg(long, default_value_t = 30)]
    window_days: u32,
    #[arg(long, default_value_t = 10)]
    limit:       u32,
  },
  /// Recent orders across all customers.
  Orders {
    #[arg(long, default_value_t = 50)]
    limit:  u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
  },
  /// Order status changes and cancellations.
  Audit {
    #[arg(long, default_value_t = 200)]
    limit:  u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
  },
  /// Recent shopper sessions.
  Sessions {
    #[arg(long, default_value_t = 72)]
    hours:    u32,
    #[arg(long)]
    customer: Option<CustomerId>,
    #[arg(long, default_value_t = 100)]
    limit:    u32,
  },
  /// Every funnel event in one session.
  Events { session_id: String },
  /// Product detail as seen from a journey.
  Product { product_id: ProductId },
  /// Download every dashboard chart as PNG.
  Charts {
    #[arg(long, default_value = ".")]
    out:            PathBuf,
    #[arg(long, default_value_t = 90)]
    trend_days:     u32,
    #[arg(long, default_value_t = 30)]
    perf_days:      u32,
    #[arg(long, default_value_t = 10)]
    top_n:          u32,
    #[arg(long, default_value = "category_l1")]
    category_level: String,
  },
}

pub async fn run(ctx: &Context, cmd: AdminCmd) -> anyhow::Result<()> {
  let admin = AdminClient::new(ctx.api.clone());
  if !matches!(cmd, AdminCmd::Login { .. } | AdminCmd::Logout) && !admin.is_signed_in() {
    anyhow::bail!("admin sign-in required: run `globalcart admin login <username>` first");
  }

  match cmd {
    AdminCmd::Login { username, password } => {
      let password = prompt_secret("Admin password", password)?;
      match admin.login(&username, &password).await? {
        Durability::Persisted => println!("Signed in as admin."),
        Durability::MemoryOnly => {
          println!("Signed in as admin (key could not be saved; it ends with this command).")
        }
      }
    }
    AdminCmd::Logout => {
      admin.logout();
      println!("Admin signed out.");
    }

    AdminCmd::Kpis => {
      let k = admin.kpis_latest().await?;
      println!("{} · snapshot {} · updated {}", k.label, k.snapshot_ts, k.kpi_last_updated_at);
      for (name, value) in &k.metrics {
        println!("  {name:<32} {value:>14.2}");
      }
    }

    AdminCmd::Funnel { window_days, limit } => {
      let report = admin.funnel(window_days, Page::first(limit)).await;
      match report.summary {
        Ok(s) => {
          println!("Funnel, last {} days", s.window_days);
          println!(
            "  views {} → carts {} → checkouts {} → payments {} → orders {}",
            s.product_views, s.add_to_cart, s.checkout_started, s.payment_attempts, s.orders_placed
          );
          println!(
            "  conversion {:.2}%  cart abandonment {:.2}%  payment failures {:.2}%",
            s.conversion_rate * 100.0,
            s.cart_abandonment_rate * 100.0,
            s.payment_failure_rate * 100.0
          );
          println!("  net revenue ex tax        ₹{}", s.net_revenue_ex_tax);
          println!("  lost to cart abandonment  ₹{}", s.revenue_lost_cart_abandonment);
          println!("  lost to payment failures  ₹{}", s.revenue_lost_payment_failures);
          println!("  refunds                   ₹{}", s.refunds_leakage);
          println!("  net after leakage         ₹{}", s.net_revenue_after_leakage);
        }
        Err(e) => eprintln!("summary unavailable: {e}"),
      }
      match report.product_leakage {
        Ok(rows) => {
          println!("Product leakage");
          for r in rows {
            println!(
              "  #{:<6} {:<32} abandoned {:>4} (₹{})  failed {:>3} (₹{})",
              r.product_id,
              r.product_name,
              r.abandoned_adds,
              r.revenue_lost_cart_abandonment,
              r.failed_orders,
              r.revenue_lost_payment_failures
            );
          }
        }
        Err(e) => eprintln!("product leakage unavailable: {e}"),
      }
      match report.payment_failures {
        Ok(rows) => {
          println!("Payment failures");
          for r in rows {
            println!(
              "  {} {:<10} {:<12} {:<20} ×{:<4} ₹{}",
              r.event_dt,
              r.payment_method,
              r.payment_provider,
              r.failure_reason.as_deref().unwrap_or("-"),
              r.failed_payments,
              r.revenue_at_risk_ex_tax
            );
          }
        }
        Err(e) => eprintln!("payment failures unavailable: {e}"),
      }
    }

    AdminCmd::Orders { limit, offset } => {
      for o in admin.orders(Page { limit, offset }).await? {
        let who = o.customer_email.or(o.customer_name).unwrap_or_else(|| format!("#{}", o.customer_id));
        println!(
          "#{:<7} {} {:<10} ₹{:>10}  {}  {}",
          o.order_id,
          o.order_ts,
          o.order_status,
          o.net_amount,
          who,
          o.channel.as_deref().unwrap_or("")
        );
      }
    }

    AdminCmd::Audit { limit, offset } => {
      for a in admin.audit_log(Page { limit, offset }).await? {
        println!(
          "{} #{:<7} {:<12} {:<8} {}",
          a.event_ts,
          a.order_id,
          a.action,
          a.actor_type,
          a.reason.as_deref().unwrap_or("")
        );
      }
    }

    AdminCmd::Sessions { hours, customer, limit } => {
      let sessions = admin.journey_sessions(hours, customer, Page::first(limit)).await?;
      if sessions.is_empty() {
        println!("No sessions in the last {hours}h.");
      }
      for s in sessions {
        let who = s.customer_id.map_or_else(|| "guest".to_owned(), |c| format!("#{c}"));
        println!(
          "{:<24} {:<8} {:>4} events  {} → {}  {} {}",
          s.session_id,
          who,
          s.event_count,
          s.first_event_ts,
          s.last_event_ts,
          s.channel.as_deref().unwrap_or(""),
          s.device.as_deref().unwrap_or("")
        );
      }
    }

    AdminCmd::Events { session_id } => {
      for e in admin.journey_events(&session_id).await? {
        let mut extra = Vec::new();
        if let Some(p) = e.product_id {
          extra.push(format!("product #{p}"));
        }
        if let Some(o) = e.order_id {
          extra.push(format!("order #{o}"));
        }
        if let Some(r) = e.failure_reason {
          extra.push(r);
        }
        println!("{} {:<18} {}", e.event_ts, e.stage, extra.join(", "));
      }
    }

    AdminCmd::Product { product_id } => {
      let d = admin.journey_product(product_id).await?;
      println!("{} (#{}) · {}", d.product.product_name, d.product.product_id, d.product.sku);
      println!("  ₹{} (list ₹{}) · stock {}", d.product.sell_price, d.product.list_price, d.stock_qty);
    }

    AdminCmd::Charts { out, trend_days, perf_days, top_n, category_level } => {
      std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;
      let params = ChartParams { trend_days, perf_days, top_n, category_level };
      let mut failed = 0;
      for (chart, result) in admin.refresh_charts(&params).await {
        match result {
          Ok(png) => {
            let path = out.join(format!("{}.png", chart.name()));
            std::fs::write(&path, &png)
              .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{:<22} {}", chart.name(), path.display());
          }
          Err(e) => {
            failed += 1;
            eprintln!("{:<22} failed: {e}", chart.name());
          }
        }
      }
      if failed > 0 {
        anyhow::bail!("{failed} chart(s) failed to render");
      }
    }
  }
  Ok(())
}
