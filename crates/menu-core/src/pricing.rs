//! # Pricing
//!
//! The one canonical breakdown computation. The server uses it for quotes
//! and orders; clients receive its output instead of re-deriving it.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lines ──► subtotal = Σ price × qty        (exact, integer cents)       │
//! │                 │                                                       │
//! │                 ├──► tax      = subtotal × tax_rate     (if enabled)    │
//! │                 ├──► service  = subtotal × service_rate (if enabled)    │
//! │                 └──► discount = subtotal × pct  |  min(fixed, subtotal) │
//! │                                                                         │
//! │  total = subtotal + tax + service − discount, clamped at 0              │
//! │                                                                         │
//! │  Tax is charged on the PRE-discount subtotal.                           │
//! │  Each component is rounded half-up exactly once, from the exact         │
//! │  subtotal; nothing is rounded twice.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, TaxSettings};

/// A priced line: unit price and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLine {
    pub unit_price: Money,
    pub quantity: i64,
}

impl PriceLine {
    pub const fn new(unit_price: Money, quantity: i64) -> Self {
        PriceLine {
            unit_price,
            quantity,
        }
    }

    #[inline]
    pub fn total(&self) -> CoreResult<Money> {
        self.unit_price
            .multiply_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow)
    }
}

/// The computed money fields of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Breakdown {
    #[serde(rename = "subtotalCents")]
    pub subtotal: Money,
    #[serde(rename = "taxCents")]
    pub tax: Money,
    #[serde(rename = "serviceTaxCents")]
    pub service_tax: Money,
    #[serde(rename = "discountCents")]
    pub discount: Money,
    #[serde(rename = "totalCents")]
    pub total: Money,
}

impl Discount {
    /// The amount this discount takes off `subtotal`.
    ///
    /// Fixed discounts are capped at the subtotal; percentages above 100% are
    /// rejected when the voucher is saved, but the cap applies to them too.
    ///
    /// ```rust
    /// use menu_core::{Discount, Money, Percent};
    ///
    /// let subtotal = Money::from_cents(8_000);
    /// assert_eq!(Discount::Fixed(Money::from_cents(10_000)).amount_for(subtotal), subtotal);
    /// assert_eq!(
    ///     Discount::Percentage(Percent::from_whole(10)).amount_for(subtotal).cents(),
    ///     800
    /// );
    /// ```
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let subtotal = subtotal.non_negative();
        match self {
            Discount::Percentage(pct) => pct.of(subtotal).min(subtotal),
            Discount::Fixed(amount) => amount.non_negative().min(subtotal),
        }
    }
}

/// Sum of line totals.
pub fn subtotal(lines: &[PriceLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.total()?).ok_or(CoreError::AmountOverflow)
    })
}

/// Computes the full breakdown for a set of lines.
///
/// Pure: identical inputs always give an identical breakdown. An empty line
/// list yields all zeros. Fails with [`CoreError::AmountOverflow`] rather
/// than wrapping when the amounts leave the `i64` range.
pub fn compute_breakdown(
    lines: &[PriceLine],
    settings: &TaxSettings,
    discount: Option<&Discount>,
) -> CoreResult<Breakdown> {
    let subtotal = subtotal(lines)?;

    let tax = if settings.tax_enabled {
        settings.tax_rate.of(subtotal)
    } else {
        Money::zero()
    };

    let service_tax = if settings.service_enabled {
        settings.service_rate.of(subtotal)
    } else {
        Money::zero()
    };

    let discount = discount
        .map(|d| d.amount_for(subtotal))
        .unwrap_or_default();

    // Discount never exceeds the subtotal, so only the additions can overflow
    let total = Money::checked_sum([subtotal, tax, service_tax])
        .ok_or(CoreError::AmountOverflow)?;
    let total = (total - discount).non_negative();

    Ok(Breakdown {
        subtotal,
        tax,
        service_tax,
        discount,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Percent;

    fn settings(tax: u32, service: Option<u32>) -> TaxSettings {
        TaxSettings {
            tax_rate: Percent::from_whole(tax),
            tax_enabled: true,
            service_rate: Percent::from_whole(service.unwrap_or(10)),
            service_enabled: service.is_some(),
        }
    }

    fn one_pizza() -> Vec<PriceLine> {
        vec![PriceLine::new(Money::from_cents(14_000), 1)]
    }

    #[test]
    fn test_scenario_a_tax_only() {
        let b = compute_breakdown(&one_pizza(), &settings(15, None), None).unwrap();

        assert_eq!(b.subtotal.cents(), 14_000);
        assert_eq!(b.tax.cents(), 2_100);
        assert_eq!(b.service_tax, Money::zero());
        assert_eq!(b.discount, Money::zero());
        assert_eq!(b.total.cents(), 16_100);
    }

    #[test]
    fn test_scenario_b_percentage_voucher_after_tax() {
        let voucher = Discount::Percentage(Percent::from_whole(10));
        let b = compute_breakdown(&one_pizza(), &settings(15, None), Some(&voucher)).unwrap();

        // Tax is still charged on the pre-discount 140.00
        assert_eq!(b.tax.cents(), 2_100);
        assert_eq!(b.discount.cents(), 1_400);
        assert_eq!(b.total.cents(), 14_700);
    }

    #[test]
    fn test_service_tax() {
        let lines = [
            PriceLine::new(Money::from_cents(12_000), 1),
            PriceLine::new(Money::from_cents(3_500), 2),
        ];
        let b = compute_breakdown(&lines, &settings(15, Some(10)), None).unwrap();

        assert_eq!(b.subtotal.cents(), 19_000);
        assert_eq!(b.tax.cents(), 2_850);
        assert_eq!(b.service_tax.cents(), 1_900);
        assert_eq!(b.total.cents(), 23_750);
    }

    #[test]
    fn test_disabled_rates() {
        let settings = TaxSettings {
            tax_enabled: false,
            ..TaxSettings::default()
        };
        let b = compute_breakdown(&one_pizza(), &settings, None).unwrap();
        assert_eq!(b.tax, Money::zero());
        assert_eq!(b.total.cents(), 14_000);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let lines = [PriceLine::new(Money::from_cents(3_500), 1)];
        let voucher = Discount::Fixed(Money::from_cents(5_000));
        let b = compute_breakdown(&lines, &settings(15, None), Some(&voucher)).unwrap();

        assert_eq!(b.discount.cents(), 3_500);
        // Tax on the pre-discount subtotal survives
        assert_eq!(b.total.cents(), 525);
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let voucher = Discount::Fixed(Money::from_cents(1_000));
        let b = compute_breakdown(&[], &settings(15, Some(10)), Some(&voucher)).unwrap();
        assert_eq!(b, Breakdown::default());
    }

    #[test]
    fn test_single_rounding_per_component() {
        // 3 × 0.33 = 0.99; 0.99 × 15% = 0.1485 → 0.15
        let lines = [PriceLine::new(Money::from_cents(33), 3)];
        let b = compute_breakdown(&lines, &settings(15, None), None).unwrap();
        assert_eq!(b.tax.cents(), 15);

        // 12.5% of 0.99 = 0.12375 → 0.12
        let voucher = Discount::Percentage(Percent::from_bps(1_250));
        let b = compute_breakdown(&lines, &settings(15, None), Some(&voucher)).unwrap();
        assert_eq!(b.discount.cents(), 12);
        assert_eq!(b.total, b.subtotal + b.tax + b.service_tax - b.discount);
    }

    #[test]
    fn test_deterministic() {
        let lines = [
            PriceLine::new(Money::from_cents(9_500), 3),
            PriceLine::new(Money::from_cents(6_500), 1),
        ];
        let voucher = Discount::Percentage(Percent::from_bps(1_750));
        let a = compute_breakdown(&lines, &settings(15, Some(10)), Some(&voucher)).unwrap();
        let b = compute_breakdown(&lines, &settings(15, Some(10)), Some(&voucher)).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_discount_formula() {
        let subtotal = Money::from_cents(25_000);
        for pct in [1, 10, 33, 50, 100] {
            let d = Discount::Percentage(Percent::from_whole(pct));
            assert_eq!(d.amount_for(subtotal).cents(), 25_000 * pct as i64 / 100);
        }
        for fixed in [1, 2_500, 25_000, 99_999] {
            let d = Discount::Fixed(Money::from_cents(fixed));
            assert_eq!(d.amount_for(subtotal).cents(), fixed.min(25_000));
        }
    }

    #[test]
    fn test_overflowing_line_is_an_error() {
        let lines = [PriceLine::new(Money::from_cents(i64::MAX / 2), 3)];
        let result = compute_breakdown(&lines, &settings(15, Some(10)), None);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_overflowing_subtotal_is_an_error() {
        let lines = [
            PriceLine::new(Money::from_cents(i64::MAX / 2), 1),
            PriceLine::new(Money::from_cents(i64::MAX / 2), 1),
            PriceLine::new(Money::from_cents(i64::MAX / 2), 1),
        ];
        assert!(matches!(subtotal(&lines), Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_overflowing_tax_is_an_error() {
        // Subtotal fits, subtotal plus 15% tax does not
        let lines = [PriceLine::new(Money::from_cents(i64::MAX - 10), 1)];
        let result = compute_breakdown(&lines, &settings(15, None), None);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_largest_cart_fits() {
        let lines: Vec<PriceLine> = (0..crate::MAX_CART_ITEMS)
            .map(|_| {
                PriceLine::new(
                    Money::from_cents(crate::MAX_PRICE_CENTS),
                    crate::MAX_ITEM_QUANTITY,
                )
            })
            .collect();
        let b = compute_breakdown(&lines, &settings(100, Some(100)), None).unwrap();
        assert_eq!(b.total, Money::from_cents(b.subtotal.cents() * 3));
    }

    #[test]
    fn test_wire_names() {
        let b = compute_breakdown(&one_pizza(), &settings(15, None), None).unwrap();
        let json = serde_json::to_value(b).unwrap();
        assert_eq!(json["subtotalCents"], 14_000);
        assert_eq!(json["taxCents"], 2_100);
        assert_eq!(json["totalCents"], 16_100);
    }
}
