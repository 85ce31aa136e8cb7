//! Tests for `SqliteStore` against in-memory and on-disk databases.

use std::sync::Arc;

use globalcart_core::{
  cart::CartEngine,
  model::Customer,
  storage::{CART_KEY, KeyValueStore, Persistence},
};

use crate::SqliteStore;

fn store() -> SqliteStore { SqliteStore::open_in_memory().expect("in-memory store") }

#[test]
fn set_get_overwrite_delete() {
  let s = store();
  assert_eq!(s.get("k").unwrap(), None);

  s.set("k", "\"one\"").unwrap();
  assert_eq!(s.get("k").unwrap().as_deref(), Some("\"one\""));

  s.set("k", "\"two\"").unwrap();
  assert_eq!(s.get("k").unwrap().as_deref(), Some("\"two\""));
  assert_eq!(s.entries().unwrap().len(), 1);

  assert!(s.delete("k").unwrap());
  assert!(!s.delete("k").unwrap());
  assert_eq!(s.get("k").unwrap(), None);
}

#[test]
fn entries_carry_timestamps() {
  let s = store();
  let before = chrono::Utc::now() - chrono::Duration::seconds(1);
  s.set("b", "2").unwrap();
  s.set("a", "1").unwrap();
  let entries = s.entries().unwrap();
  let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
  assert_eq!(keys, ["a", "b"]);
  assert!(entries.iter().all(|e| e.updated_at >= before));
}

#[test]
fn remove_through_trait_is_idempotent() {
  let s = store();
  s.set_raw("x", "1").unwrap();
  s.remove("x").unwrap();
  s.remove("x").unwrap();
  assert_eq!(s.get_raw("x").unwrap(), None);
}

#[test]
fn cart_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("globalcart.db");

  {
    let p = Arc::new(Persistence::new(Arc::new(SqliteStore::open(&path).unwrap())));
    let cart = CartEngine::new(p.clone());
    cart.add_item(10, 2);
    cart.add_item(11, 30);
    p.set_customer(Some(&Customer {
      customer_id:  3,
      email:        "ravi@example.com".into(),
      display_name: Some("Ravi".into()),
    }));
  }

  let p = Arc::new(Persistence::new(Arc::new(SqliteStore::open(&path).unwrap())));
  let cart = CartEngine::new(p.clone()).snapshot();
  assert_eq!(cart.qty_of(10), Some(2));
  assert_eq!(cart.qty_of(11), Some(20));
  assert_eq!(p.customer().map(|c| c.customer_id), Some(3));
}

#[test]
fn malformed_cart_row_reads_as_empty() {
  let s = Arc::new(store());
  s.set(CART_KEY, "{\"items\": 5").unwrap();
  let cart = CartEngine::new(Arc::new(Persistence::new(s)));
  assert!(cart.snapshot().is_empty());
}

#[test]
fn session_id_persists_across_adapters() {
  let s: Arc<SqliteStore> = Arc::new(store());
  let first = Persistence::new(s.clone()).session_id();
  let second = Persistence::new(s.clone()).session_id();
  assert_eq!(first, second);
  let stored: String = serde_json::from_str(&s.get("gc_session_id").unwrap().unwrap()).unwrap();
  assert_eq!(stored, first);
}

#[test]
fn open_creates_missing_directories() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested/deeper/state.db");
  let s = SqliteStore::open(&path).unwrap();
  s.set("k", "1").unwrap();
  assert!(path.exists());
}

#[test]
fn unusable_directory_reports_the_io_cause() {
  let dir = tempfile::tempdir().unwrap();
  let blocker = dir.path().join("not-a-dir");
  std::fs::write(&blocker, b"").unwrap();

  let err = SqliteStore::open(blocker.join("state.db")).err().unwrap();
  assert!(matches!(err, crate::Error::Io(_)), "got {err}");
  assert!(err.to_string().starts_with("could not create store directory"));
}
