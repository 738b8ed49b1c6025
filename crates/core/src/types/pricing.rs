//! Bundle pricing arithmetic.
//!
//! A bundle is sold at a fixed `discounted_price`. Its "actual" price is the
//! sum of the unit prices of the products linked to it; the difference is the
//! customer's saving.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Savings as a percentage of `actual`, clamped to `[0, 100]`.
///
/// Returns zero when there is nothing to save from: an empty or free bundle
/// (`actual <= 0`) or a discounted price at or above the actual price.
#[must_use]
pub fn savings_percentage(actual: Decimal, discounted: Decimal) -> Decimal {
    if actual <= Decimal::ZERO || discounted >= actual {
        return Decimal::ZERO;
    }

    let percentage = (actual - discounted) / actual * Decimal::ONE_HUNDRED;
    percentage.min(Decimal::ONE_HUNDRED)
}

/// Format a percentage with one decimal place and a trailing `%`.
///
/// Midpoints round away from zero (`12.25` becomes `"12.3%"`).
#[must_use]
pub fn format_percentage(percentage: Decimal) -> String {
    let mut rounded = percentage.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(1);
    format!("{rounded}%")
}

/// Computed pricing figures for a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlePricing {
    /// Sum of the linked products' unit prices.
    pub actual_price: Decimal,
    /// Price the bundle is sold at.
    pub discounted_price: Decimal,
    /// `actual_price - discounted_price` (negative when the bundle costs more).
    pub savings_amount: Decimal,
    /// Savings in percent, within `[0, 100]`.
    pub savings_percentage: Decimal,
    /// Savings percentage as display text, e.g. `"20.0%"`.
    pub savings_formatted: String,
}

impl BundlePricing {
    /// Derive every pricing figure from the two input prices.
    #[must_use]
    pub fn compute(actual_price: Decimal, discounted_price: Decimal) -> Self {
        let savings_percentage = savings_percentage(actual_price, discounted_price);
        Self {
            actual_price,
            discounted_price,
            savings_amount: actual_price - discounted_price,
            savings_percentage,
            savings_formatted: format_percentage(savings_percentage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_twenty_percent_bundle() {
        let pricing = BundlePricing::compute(d(1000) + d(1500), d(2000));
        assert_eq!(pricing.actual_price, d(2500));
        assert_eq!(pricing.savings_amount, d(500));
        assert_eq!(pricing.savings_percentage, d(20));
        assert_eq!(pricing.savings_formatted, "20.0%");
    }

    #[test]
    fn test_empty_bundle_has_no_savings() {
        let pricing = BundlePricing::compute(Decimal::ZERO, d(2000));
        assert_eq!(pricing.savings_percentage, Decimal::ZERO);
        assert_eq!(pricing.savings_formatted, "0.0%");
    }

    #[test]
    fn test_discounted_above_actual_is_zero_not_negative() {
        assert_eq!(savings_percentage(d(1000), d(1200)), Decimal::ZERO);
        assert_eq!(savings_percentage(d(1000), d(1000)), Decimal::ZERO);
    }

    #[test]
    fn test_negative_discounted_price_is_capped() {
        assert_eq!(savings_percentage(d(1000), d(-50)), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_free_bundle_is_full_saving() {
        assert_eq!(savings_percentage(d(800), Decimal::ZERO), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_percentage_stays_in_range() {
        for actual in [1_i64, 7, 99, 2500, 10_000] {
            for discounted in [0_i64, 1, 6, 98, 2499, 20_000] {
                let pct = savings_percentage(d(actual), d(discounted));
                assert!(pct >= Decimal::ZERO, "{actual}/{discounted} -> {pct}");
                assert!(pct <= Decimal::ONE_HUNDRED, "{actual}/{discounted} -> {pct}");
            }
        }
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        assert_eq!(format_percentage(Decimal::new(1225, 2)), "12.3%");
        assert_eq!(format_percentage(Decimal::new(33_333, 3)), "33.3%");
        assert_eq!(format_percentage(d(100)), "100.0%");
    }
}
