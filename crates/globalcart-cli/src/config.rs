//! Layered client configuration: defaults, then an optional TOML file, then
//! `GLOBALCART_*` environment variables. Command-line flags are applied on
//! top by the caller.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime client configuration, deserialised from `globalcart.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  pub api_base_url:          String,
  pub store_path:            PathBuf,
  /// No client-side timeout when unset.
  pub request_timeout_secs:  Option<u64>,
  pub confirmation_delay_ms: u64,
  pub currency:              String,
  pub channel:               String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_base_url:          "http://127.0.0.1:8000".to_owned(),
      store_path:            PathBuf::from("~/.local/share/globalcart/client.db"),
      request_timeout_secs:  None,
      confirmation_delay_ms: 5800,
      currency:              "INR".to_owned(),
      channel:               "WEB".to_owned(),
    }
  }
}

impl ClientConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("GLOBALCART"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ClientConfig")
  }

  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_secs.map(Duration::from_secs)
  }

  pub fn confirmation_delay(&self) -> Duration {
    Duration::from_millis(self.confirmation_delay_ms)
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:8000");
    assert_eq!(cfg.confirmation_delay(), Duration::from_millis(5800));
    assert_eq!(cfg.request_timeout(), None);
    assert_eq!(cfg.currency, "INR");
  }

  #[test]
  fn file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "api_base_url = \"http://shop.test:9000\"").unwrap();
    writeln!(file, "request_timeout_secs = 15").unwrap();
    writeln!(file, "confirmation_delay_ms = 0").unwrap();

    let cfg = ClientConfig::load(file.path()).unwrap();
    assert_eq!(cfg.api_base_url, "http://shop.test:9000");
    assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(cfg.confirmation_delay(), Duration::ZERO);
    assert_eq!(cfg.channel, "WEB");
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let cfg = ClientConfig { store_path: PathBuf::from("~/gc/client.db"), ..Default::default() };
    assert_eq!(cfg.resolved_store_path(), PathBuf::from(home).join("gc/client.db"));
  }
}
