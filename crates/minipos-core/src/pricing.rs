//! # Pricing
//!
//! Sale totals plus the two server-side policies that decide where a unit
//! price and the tax amount come from.
//!
//! ```text
//! line.total_price = unit_price × quantity
//! total_amount     = Σ line.total_price
//! final_amount     = total_amount − discount_amount + tax_amount
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Policies
// =============================================================================

/// Where a line's unit price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Always charge the catalog price; caller prices are ignored.
    #[default]
    CatalogOnly,
    /// Honour a caller-supplied unit price and flag the line as overridden.
    AllowOverride,
}

impl PricingPolicy {
    /// Resolves the unit price for one line.
    ///
    /// Returns the price to charge and whether it differs in origin from the
    /// catalog (the `price_overridden` audit flag).
    pub fn resolve_unit_price(&self, catalog: Money, proposed: Option<Money>) -> (Money, bool) {
        match (self, proposed) {
            (PricingPolicy::AllowOverride, Some(price)) => (price, true),
            _ => (catalog, false),
        }
    }
}

/// Where a sale's tax amount comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxPolicy {
    /// Use the request's `tax_amount` as given.
    #[default]
    CallerSupplied,
    /// Compute tax on `total − discount`, ignoring the request.
    Rate(TaxRate),
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Computed header amounts for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub total_amount: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub final_amount: Money,
}

impl SaleTotals {
    /// Computes totals from line totals, a discount and the tax policy.
    ///
    /// ## Errors
    /// - [`CoreError::DiscountExceedsTotal`] if the discount is larger than
    ///   the sum of the lines
    /// - [`CoreError::AmountOverflow`] if a total does not fit in `Money`
    pub fn compute<I>(
        lines: I,
        discount: Money,
        caller_tax: Money,
        policy: TaxPolicy,
    ) -> CoreResult<SaleTotals>
    where
        I: IntoIterator<Item = Money>,
    {
        let total_amount = lines
            .into_iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line))
            .ok_or_else(|| overflow("total_amount"))?;

        if discount > total_amount {
            return Err(CoreError::DiscountExceedsTotal {
                discount: discount.cents(),
                total: total_amount.cents(),
            });
        }

        let tax_amount = match policy {
            TaxPolicy::CallerSupplied => caller_tax,
            TaxPolicy::Rate(rate) => (total_amount - discount).calculate_tax(rate),
        };

        // Discount ≤ total was checked above, so only the tax can overflow
        let final_amount = (total_amount - discount)
            .checked_add(tax_amount)
            .ok_or_else(|| overflow("final_amount"))?;

        Ok(SaleTotals {
            total_amount,
            discount_amount: discount,
            tax_amount,
            final_amount,
        })
    }
}

fn overflow(field: &str) -> CoreError {
    CoreError::AmountOverflow {
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        // {A, qty 2, unit_price 2500}, discount 0, tax 250
        let lines = [Money::from_cents(2500).multiply_quantity(2)];
        let totals = SaleTotals::compute(
            lines,
            Money::zero(),
            Money::from_cents(250),
            TaxPolicy::CallerSupplied,
        )
        .unwrap();

        assert_eq!(totals.total_amount.cents(), 5000);
        assert_eq!(totals.final_amount.cents(), 5250);
    }

    #[test]
    fn test_discount_applied() {
        let lines = [Money::from_cents(1000), Money::from_cents(500)];
        let totals =
            SaleTotals::compute(lines, Money::from_cents(300), Money::zero(), TaxPolicy::default())
                .unwrap();
        assert_eq!(totals.final_amount.cents(), 1200);
    }

    #[test]
    fn test_discount_may_equal_total() {
        let lines = [Money::from_cents(1000)];
        let totals =
            SaleTotals::compute(lines, Money::from_cents(1000), Money::zero(), TaxPolicy::default())
                .unwrap();
        assert!(totals.final_amount.is_zero());
    }

    #[test]
    fn test_discount_exceeding_total_rejected() {
        let lines = [Money::from_cents(1000)];
        let err =
            SaleTotals::compute(lines, Money::from_cents(1001), Money::zero(), TaxPolicy::default())
                .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DiscountExceedsTotal {
                discount: 1001,
                total: 1000
            }
        ));
    }

    #[test]
    fn test_line_sum_overflow_is_an_error() {
        let line = Money::from_cents(i64::MAX / 2 + 10);
        let err = SaleTotals::compute([line, line], Money::zero(), Money::zero(), TaxPolicy::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { ref field } if field == "total_amount"));
    }

    #[test]
    fn test_tax_overflow_is_an_error() {
        let err = SaleTotals::compute(
            [Money::from_cents(2500)],
            Money::zero(),
            Money::from_cents(i64::MAX),
            TaxPolicy::CallerSupplied,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { ref field } if field == "final_amount"));
    }

    #[test]
    fn test_rate_policy_ignores_caller_tax() {
        let lines = [Money::from_cents(1100)];
        let totals = SaleTotals::compute(
            lines,
            Money::from_cents(100),
            Money::from_cents(9999),
            TaxPolicy::Rate(TaxRate::from_bps(825)),
        )
        .unwrap();

        // 8.25% of $10.00 = $0.825 → $0.83
        assert_eq!(totals.tax_amount.cents(), 83);
        assert_eq!(totals.final_amount.cents(), 1083);
    }

    #[test]
    fn test_pricing_policy() {
        let catalog = Money::from_cents(1000);
        let proposed = Some(Money::from_cents(800));

        assert_eq!(
            PricingPolicy::CatalogOnly.resolve_unit_price(catalog, proposed),
            (catalog, false)
        );
        assert_eq!(
            PricingPolicy::AllowOverride.resolve_unit_price(catalog, proposed),
            (Money::from_cents(800), true)
        );
        assert_eq!(
            PricingPolicy::AllowOverride.resolve_unit_price(catalog, None),
            (catalog, false)
        );
    }
}
