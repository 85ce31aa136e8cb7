//! Display totals for the checkout summary. The server computes the amounts
//! actually charged.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{CartLine, ProductId};

/// 7 %.
pub const TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
  pub subtotal:        Decimal,
  pub tax:             Decimal,
  pub pre_promo_total: Decimal,
  pub discount:        Decimal,
  pub payable:         Decimal,
}

impl Totals {
  /// Lines whose price is unknown contribute nothing, and neither does a
  /// line that would overflow the running subtotal.
  pub fn compute(
    lines: &[CartLine],
    prices: &BTreeMap<ProductId, Decimal>,
    discount: Decimal,
  ) -> Self {
    let subtotal = lines
      .iter()
      .filter_map(|l| prices.get(&l.product_id)?.checked_mul(Decimal::from(l.qty)))
      .fold(Decimal::ZERO, |sum, line| sum.checked_add(line).unwrap_or(sum));
    Self::from_subtotal(subtotal, discount)
  }

  pub fn from_subtotal(subtotal: Decimal, discount: Decimal) -> Self {
    let tax = round2(subtotal * TAX_RATE);
    let pre_promo_total = round2(subtotal.saturating_add(tax));
    let payable = round2(pre_promo_total.saturating_sub(discount)).max(Decimal::ZERO);
    Self { subtotal, tax, pre_promo_total, discount, payable }
  }
}

pub fn round2(v: Decimal) -> Decimal {
  v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> Decimal { s.parse().unwrap() }

  #[test]
  fn tax_and_promo_arithmetic() {
    let t = Totals::from_subtotal(d("1000"), d("100"));
    assert_eq!(t.tax, d("70"));
    assert_eq!(t.pre_promo_total, d("1070"));
    assert_eq!(t.payable, d("970"));
  }

  #[test]
  fn payable_never_negative() {
    let t = Totals::from_subtotal(d("10"), d("500"));
    assert_eq!(t.payable, Decimal::ZERO);
  }

  #[test]
  fn rounds_half_away_from_zero() {
    // 0.5 * 0.07 = 0.035
    let t = Totals::from_subtotal(d("0.5"), Decimal::ZERO);
    assert_eq!(t.tax, d("0.04"));
    assert_eq!(t.pre_promo_total, d("0.54"));
  }

  #[test]
  fn compute_uses_known_prices_only() {
    let lines = [CartLine { product_id: 1, qty: 2 }, CartLine { product_id: 2, qty: 1 }];
    let prices = BTreeMap::from([(1, d("250.00"))]);
    let t = Totals::compute(&lines, &prices, Decimal::ZERO);
    assert_eq!(t.subtotal, d("500"));
    assert_eq!(t.payable, d("535"));
  }

  #[test]
  fn overflowing_line_is_left_out() {
    let lines = [CartLine { product_id: 1, qty: 20 }, CartLine { product_id: 2, qty: 1 }];
    let prices = BTreeMap::from([(1, Decimal::MAX), (2, d("10.00"))]);
    let t = Totals::compute(&lines, &prices, Decimal::ZERO);
    assert_eq!(t.subtotal, d("10"));
    assert_eq!(t.payable, d("10.70"));
  }

  #[test]
  fn huge_subtotal_does_not_panic() {
    let lines = [CartLine { product_id: 1, qty: 1 }, CartLine { product_id: 2, qty: 1 }];
    let prices = BTreeMap::from([(1, Decimal::MAX), (2, Decimal::MAX)]);
    let t = Totals::compute(&lines, &prices, Decimal::MIN);
    assert_eq!(t.subtotal, Decimal::MAX);
    assert_eq!(t.pre_promo_total, Decimal::MAX);
    assert_eq!(t.payable, Decimal::MAX);
  }
}
