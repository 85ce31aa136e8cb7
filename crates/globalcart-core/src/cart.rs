//! The cart engine: a write-through wrapper around the persisted cart.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::model::CartLine;
use crate::{
  model::ProductId,
  storage::{CART_KEY, Persistence},
};

pub const MIN_QTY: u32 = 1;
pub const MAX_QTY: u32 = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  #[serde(default)]
  pub items: Vec<CartLine>,
}

impl Cart {
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Total units across all lines.
  pub fn count(&self) -> u32 { self.items.iter().map(|l| l.qty).sum() }

  pub fn qty_of(&self, product_id: ProductId) -> Option<u32> {
    self.items.iter().find(|l| l.product_id == product_id).map(|l| l.qty)
  }

  /// Merge duplicate lines and clamp every quantity into range.
  fn sanitize(self) -> Self {
    let mut order = Vec::new();
    let mut qty: HashMap<ProductId, u64> = HashMap::new();
    for line in self.items {
      let entry = qty.entry(line.product_id).or_insert_with(|| {
        order.push(line.product_id);
        0
      });
      *entry += u64::from(line.qty);
    }
    let items = order
      .into_iter()
      .map(|product_id| CartLine {
        product_id,
        qty: clamp_qty(i64::try_from(qty[&product_id]).unwrap_or(i64::MAX)),
      })
      .collect();
    Self { items }
  }
}

/// Coerce any requested quantity into `MIN_QTY..=MAX_QTY`.
pub fn clamp_qty(qty: i64) -> u32 {
  qty.clamp(i64::from(MIN_QTY), i64::from(MAX_QTY)) as u32
}

/// Owns no state of its own; every call reads the persisted cart, mutates it,
/// and writes it back before returning.
#[derive(Clone)]
pub struct CartEngine {
  persistence: Arc<Persistence>,
}

impl CartEngine {
  pub fn new(persistence: Arc<Persistence>) -> Self { Self { persistence } }

  pub fn snapshot(&self) -> Cart {
    self.persistence.get::<Cart>(CART_KEY).unwrap_or_default().sanitize()
  }

  pub fn count(&self) -> u32 { self.snapshot().count() }

  /// Add `qty` units. An existing line is incremented and capped at
  /// `MAX_QTY`; otherwise a new line is appended with `qty` coerced into
  /// range.
  pub fn add_item(&self, product_id: ProductId, qty: i64) -> Cart {
    let mut cart = self.snapshot();
    apply_add(&mut cart, product_id, qty);
    self.save(cart)
  }

  /// Add several lines at once, as when reordering a past order.
  pub fn add_items(&self, lines: impl IntoIterator<Item = (ProductId, i64)>) -> Cart {
    let mut cart = self.snapshot();
    for (product_id, qty) in lines {
      apply_add(&mut cart, product_id, qty);
    }
    self.save(cart)
  }

  pub fn remove_item(&self, product_id: ProductId) -> Cart {
    let mut cart = self.snapshot();
    cart.items.retain(|l| l.product_id != product_id);
    self.save(cart)
  }

  /// Set an existing line's quantity, clamped. Does nothing when the product
  /// is not in the cart.
  pub fn set_qty(&self, product_id: ProductId, qty: i64) -> Cart {
    let mut cart = self.snapshot();
    match cart.items.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => {
        line.qty = clamp_qty(qty);
        self.save(cart)
      }
      None => cart,
    }
  }

  pub fn clear(&self) -> Cart { self.save(Cart::default()) }

  fn save(&self, cart: Cart) -> Cart {
    if self.persistence.set(CART_KEY, &cart) {
      debug!(lines = cart.items.len(), units = cart.count(), "cart saved");
    }
    cart
  }
}

fn apply_add(cart: &mut Cart, product_id: ProductId, qty: i64) {
  match cart.items.iter_mut().find(|l| l.product_id == product_id) {
    Some(line) => {
      line.qty = clamp_qty(i64::from(line.qty).saturating_add(qty.max(0)));
    }
    None => cart.items.push(CartLine { product_id, qty: clamp_qty(qty) }),
  }
}


#[cfg(test)]
mod proptests {
  use std::collections::HashSet;

  use proptest::prelude::*;

  use super::*;

  #[derive(Debug, Clone)]
  enum Op {
    Add(ProductId, i64),
    Remove(ProductId),
    SetQty(ProductId, i64),
  }

  fn arb_qty() -> impl Strategy<Value = i64> { prop_oneof![-5i64..30, any::<i64>()] }

  fn arb_op() -> impl Strategy<Value = Op> {
    // A small id space so lines collide often.
    let id = 1i64..6;
    prop_oneof![
      (id.clone(), arb_qty()).prop_map(|(p, q)| Op::Add(p, q)),
      id.clone().prop_map(Op::Remove),
      (id, arb_qty()).prop_map(|(p, q)| Op::SetQty(p, q)),
    ]
  }

  proptest! {
    #[test]
    fn lines_stay_unique_and_in_range(ops in prop::collection::vec(arb_op(), 0..40)) {
      let persistence = Arc::new(Persistence::in_memory());
      let engine = CartEngine::new(persistence.clone());

      for op in ops {
        let cart = match op {
          Op::Add(p, q) => engine.add_item(p, q),
          Op::Remove(p) => engine.remove_item(p),
          Op::SetQty(p, q) => engine.set_qty(p, q),
        };

        let mut ids = HashSet::new();
        for line in &cart.items {
          prop_assert!(ids.insert(line.product_id), "duplicate line {}", line.product_id);
          prop_assert!((MIN_QTY..=MAX_QTY).contains(&line.qty), "qty {}", line.qty);
        }
        prop_assert_eq!(persistence.get::<Cart>(CART_KEY).unwrap_or_default(), cart.clone());
        prop_assert_eq!(engine.snapshot(), cart);
      }
    }
  }
}
