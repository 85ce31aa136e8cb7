//! Local persistence: a raw key-value seam plus the typed adapter every other
//! component reads and writes through.
//!
//! Reads never fail. Unavailable storage or a value that no longer parses is
//! treated as absent. Writes are best effort: a failure is logged and
//! reported as `false`, never raised.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use rand_core::{OsRng, RngCore};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{error::Result, model::Customer};

// ─── Keys ────────────────────────────────────────────────────────────────────

pub const SESSION_ID_KEY: &str = "gc_session_id";
pub const CUSTOMER_KEY: &str = "gc_customer";
pub const CART_KEY: &str = "gc_cart";
pub const ADMIN_KEY_KEY: &str = "globalcart_admin_key";

const SESSION_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SESSION_ID_LEN: usize = 20;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Raw string storage. Implemented by [`MemoryStore`] and by durable
/// backends such as `globalcart-store-sqlite`.
pub trait KeyValueStore: Send + Sync {
  fn get_raw(&self, key: &str) -> Result<Option<String>>;

  fn set_raw(&self, key: &str, value: &str) -> Result<()>;

  fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store. Backs `Persistence::in_memory` and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KeyValueStore for MemoryStore {
  fn get_raw(&self, key: &str) -> Result<Option<String>> {
    Ok(lock(&self.entries).get(key).cloned())
  }

  fn set_raw(&self, key: &str, value: &str) -> Result<()> {
    lock(&self.entries).insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    lock(&self.entries).remove(key);
    Ok(())
  }
}

// A poisoned map is still a valid map; keep going with it.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|e| e.into_inner())
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Whether a written value reached durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
  Persisted,
  /// Durable storage refused the write; the value lives only in this process.
  MemoryOnly,
}

/// Typed access to durable storage.
pub struct Persistence {
  durable:            Arc<dyn KeyValueStore>,
  admin_key_fallback: Mutex<Option<String>>,
}

impl Persistence {
  pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
    Self {
      durable,
      admin_key_fallback: Mutex::new(None),
    }
  }

  /// A persistence layer with no durable backing at all.
  pub fn in_memory() -> Self { Self::new(Arc::new(MemoryStore::new())) }

  // ── Generic access ────────────────────────────────────────────────────

  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let raw = match self.durable.get_raw(key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        debug!(key, error = %e, "storage read failed; treating as absent");
        return None;
      }
    };
    match serde_json::from_str(&raw) {
      Ok(v) => Some(v),
      Err(e) => {
        debug!(key, error = %e, "stored value is malformed; treating as absent");
        None
      }
    }
  }

  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
    let raw = match serde_json::to_string(value) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key, error = %e, "could not serialise value for storage");
        return false;
      }
    };
    match self.durable.set_raw(key, &raw) {
      Ok(()) => true,
      Err(e) => {
        warn!(key, error = %e, "storage write failed");
        false
      }
    }
  }

  pub fn remove(&self, key: &str) -> bool {
    match self.durable.remove(key) {
      Ok(()) => true,
      Err(e) => {
        warn!(key, error = %e, "storage remove failed");
        false
      }
    }
  }

  // ── Session identifier ────────────────────────────────────────────────

  /// The analytics session id, created and persisted on first use.
  pub fn session_id(&self) -> String {
    if let Some(id) = self.get::<String>(SESSION_ID_KEY).filter(|s| !s.is_empty()) {
      return id;
    }
    let id = generate_session_id();
    self.set(SESSION_ID_KEY, &id);
    id
  }

  // ── Customer ──────────────────────────────────────────────────────────

  /// The signed-in customer, or `None` for a guest.
  pub fn customer(&self) -> Option<Customer> { self.get(CUSTOMER_KEY) }

  /// Overwrite the stored customer; `None` signs out.
  pub fn set_customer(&self, customer: Option<&Customer>) -> bool {
    match customer {
      Some(c) => self.set(CUSTOMER_KEY, c),
      None => self.remove(CUSTOMER_KEY),
    }
  }

  // ── Admin credential ──────────────────────────────────────────────────

  pub fn admin_key(&self) -> Option<String> {
    self
      .get::<String>(ADMIN_KEY_KEY)
      .filter(|k| !k.is_empty())
      .or_else(|| lock(&self.admin_key_fallback).clone())
  }

  /// Store or clear the admin key. The in-process copy is always updated so
  /// this process keeps working even when durable storage refuses the write.
  pub fn set_admin_key(&self, key: Option<&str>) -> Durability {
    *lock(&self.admin_key_fallback) = key.map(str::to_owned);
    let ok = match key {
      Some(k) => self.set(ADMIN_KEY_KEY, k),
      None => self.remove(ADMIN_KEY_KEY),
    };
    if ok { Durability::Persisted } else { Durability::MemoryOnly }
  }
}

fn generate_session_id() -> String {
  let mut bytes = [0u8; SESSION_ID_LEN];
  OsRng.fill_bytes(&mut bytes);
  let tail: String = bytes
    .iter()
    .map(|b| SESSION_ID_ALPHABET[*b as usize % SESSION_ID_ALPHABET.len()] as char)
    .collect();
  format!("s_{tail}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  /// A durable store that refuses every operation.
  struct BrokenStore;

  impl KeyValueStore for BrokenStore {
    fn get_raw(&self, _: &str) -> Result<Option<String>> {
      Err(Error::Storage("disabled".into()))
    }

    fn set_raw(&self, _: &str, _: &str) -> Result<()> {
      Err(Error::Storage("disabled".into()))
    }

    fn remove(&self, _: &str) -> Result<()> { Err(Error::Storage("disabled".into())) }
  }

  #[test]
  fn session_id_is_stable_and_well_formed() {
    let p = Persistence::in_memory();
    let id = p.session_id();
    assert_eq!(id.len(), 22);
    assert!(id.starts_with("s_"));
    assert!(id[2..].bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    assert_eq!(p.session_id(), id);
  }

  #[test]
  fn malformed_value_reads_as_absent() {
    let store = Arc::new(MemoryStore::new());
    store.set_raw(CUSTOMER_KEY, "{not json").unwrap();
    let p = Persistence::new(store);
    assert!(p.customer().is_none());
  }

  #[test]
  fn unavailable_storage_reads_as_absent_and_writes_report_false() {
    let p = Persistence::new(Arc::new(BrokenStore));
    assert!(p.customer().is_none());
    assert!(!p.set(CART_KEY, &serde_json::json!({"items": []})));
    assert!(!p.remove(CART_KEY));
  }

  #[test]
  fn admin_key_falls_back_to_memory() {
    let p = Persistence::new(Arc::new(BrokenStore));
    assert_eq!(p.set_admin_key(Some("k-123")), Durability::MemoryOnly);
    assert_eq!(p.admin_key().as_deref(), Some("k-123"));
    p.set_admin_key(None);
    assert!(p.admin_key().is_none());
  }

  #[test]
  fn admin_key_and_customer_use_distinct_keys() {
    let p = Persistence::in_memory();
    assert_eq!(p.set_admin_key(Some("k")), Durability::Persisted);
    assert!(p.customer().is_none());
    let c = Customer { customer_id: 7, email: "a@b.c".into(), display_name: None };
    p.set_customer(Some(&c));
    assert_eq!(p.admin_key().as_deref(), Some("k"));
    p.set_customer(None);
    assert!(p.customer().is_none());
    assert_eq!(p.admin_key().as_deref(), Some("k"));
  }
}
