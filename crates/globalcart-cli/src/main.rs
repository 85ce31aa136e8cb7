//! `globalcart`: command-line storefront and admin console for GlobalCart.
//!
//! # Usage
//!
//! ```
//! globalcart products list --sort price_asc
//! globalcart cart add 42 --qty 2
//! globalcart checkout --name "Asha Rao" --phone 9876543210 --line1 "12 MG Road" \
//!   --city Bengaluru --state Karnataka --postal 560001 --promo SAVE10
//! globalcart orders cancel 1001 --reason "Order created by mistake"
//! globalcart admin charts --out ./charts
//! ```
//!
//! Settings come from `globalcart.toml` (or `--config`), then `GLOBALCART_*`
//! environment variables, then flags.

mod commands;
mod config;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use commands::{Command, Context};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "globalcart", version, about = "GlobalCart storefront and admin client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "globalcart.toml")]
  config: PathBuf,

  /// Base URL of the GlobalCart API (overrides the config file).
  #[arg(long, env = "GLOBALCART_URL")]
  api_url: Option<String>,

  /// Local state database (overrides the config file).
  #[arg(long, value_name = "PATH")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  let mut cfg = ClientConfig::load(&cli.config)?;

  // Flags override the file and environment.
  if let Some(url) = cli.api_url {
    cfg.api_base_url = url;
  }
  if let Some(store) = cli.store {
    cfg.store_path = store;
  }

  let ctx = Context::open(cfg)?;
  commands::run(&ctx, cli.command).await
}
