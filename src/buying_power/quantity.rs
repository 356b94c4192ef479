//! Order sizing against a margin budget

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::types::MaximumLotsResult;
use crate::common::errors::Result;
use crate::positions::PositionGroup;

/// Reason given when the group's margin does not move with its quantity
pub const DELTA_CANNOT_BE_APPLIED: &str =
    "No buying power used, delta cannot be applied";

/// Upper bound on the lots searched for a single order
const MAX_SEARCH_LOTS: i64 = 1_000_000_000_000;

/// Group holding `lots` more lots along its current side (or fewer, when
/// negative)
pub fn apply_lots(group: &PositionGroup, lots: Decimal) -> PositionGroup {
    let side = group.side().sign();
    group.with_quantity(group.quantity() + lots * side)
}

/// Finds the largest order whose resulting margin fits a target
///
/// Targets are expressed along the side the group is held on: a target
/// above the current margin grows the holding, a smaller one shrinks it,
/// zero liquidates it and a negative target liquidates and then holds the
/// opposite side up to that much margin. The margin function must be
/// non-decreasing in the absolute group quantity on each side.
pub struct OrderQuantityResolver<'a, F>
where
    F: Fn(&PositionGroup) -> Result<Decimal>,
{
    group: &'a PositionGroup,
    margin: F,
    total_portfolio_value: Decimal,
    minimum_order_margin_portfolio_percentage: Decimal,
}

impl<'a, F> OrderQuantityResolver<'a, F>
where
    F: Fn(&PositionGroup) -> Result<Decimal>,
{
    /// # Arguments
    /// * `group` - Group currently held
    /// * `margin` - Margin of the group at any quantity (account currency)
    /// * `total_portfolio_value` - Used to turn percentages into amounts
    /// * `minimum_order_margin_portfolio_percentage` - Orders moving margin less than this share of portfolio value are skipped
    pub fn new(
        group: &'a PositionGroup,
        margin: F,
        total_portfolio_value: Decimal,
        minimum_order_margin_portfolio_percentage: Decimal,
    ) -> Self {
        Self {
            group,
            margin,
            total_portfolio_value,
            minimum_order_margin_portfolio_percentage,
        }
    }

    fn margin_at(&self, quantity: Decimal) -> Result<Decimal> {
        (self.margin)(&self.group.with_quantity(quantity))
    }

    /// Lots for changing the used margin by `delta`
    pub fn for_delta(&self, delta: Decimal) -> Result<MaximumLotsResult> {
        let current = (self.margin)(self.group)?;
        self.for_target_margin(current + delta)
    }

    /// Lots for reaching `target_percentage` of portfolio value in margin
    pub fn for_target_percentage(&self, target_percentage: Decimal) -> Result<MaximumLotsResult> {
        self.for_target_margin(target_percentage * self.total_portfolio_value)
    }

    /// Lots for reaching `target` margin along the group's current side
    pub fn for_target_margin(&self, target: Decimal) -> Result<MaximumLotsResult> {
        let quantity = self.group.quantity();
        let side = self.group.side().sign();
        let current = (self.margin)(self.group)?;

        if target == current {
            return Ok(self.unchanged(target));
        }
        if self.margin_at(quantity + side)? == current {
            return Ok(MaximumLotsResult::zero(DELTA_CANNOT_BE_APPLIED));
        }

        let final_quantity = if target.is_sign_negative() && !target.is_zero() {
            if self.margin_at(-side)?.is_zero() {
                return Ok(MaximumLotsResult::zero(DELTA_CANNOT_BE_APPLIED));
            }
            -side * self.max_units(-side, target.abs())?
        } else {
            side * self.max_units(side, target)?
        };

        let lots = (final_quantity - quantity) * side;
        debug!(
            current_quantity = %quantity,
            final_quantity = %final_quantity,
            target = %target,
            lots = %lots,
            "Resolved order quantity for target margin"
        );

        if lots.is_zero() {
            return Ok(self.unchanged(target));
        }

        let change = (self.margin_at(final_quantity)? - current).abs();
        let minimum = self.minimum_order_margin_portfolio_percentage * self.total_portfolio_value;
        if change < minimum {
            return Ok(MaximumLotsResult::zero(format!(
                "The order margin change {} is below the minimum order margin of {} ({} of portfolio value)",
                change.round_dp(2).normalize(),
                minimum.round_dp(2).normalize(),
                self.minimum_order_margin_portfolio_percentage
            )));
        }

        Ok(MaximumLotsResult::lots(lots))
    }

    fn unchanged(&self, target: Decimal) -> MaximumLotsResult {
        MaximumLotsResult::zero(format!(
            "The target margin {} does not allow changing the current position of {} lots",
            target.round_dp(2).normalize(),
            self.group.quantity()
        ))
    }

    /// Largest whole number of units on `side` whose margin is within `budget`,
    /// capped at `MAX_SEARCH_LOTS`
    fn max_units(&self, side: Decimal, budget: Decimal) -> Result<Decimal> {
        let fits = |units: Decimal| -> Result<bool> { Ok(self.margin_at(side * units)? <= budget) };

        if !fits(Decimal::ONE)? {
            return Ok(Decimal::ZERO);
        }

        // estimate from the unit margin, then bracket and bisect
        let unit_margin = self.margin_at(side)?;
        let estimate = if unit_margin.is_zero() {
            Decimal::ONE
        } else {
            (budget / unit_margin).floor().max(Decimal::ONE)
        };
        let limit = Decimal::from(MAX_SEARCH_LOTS);

        let (mut low, mut high) = if fits(estimate)? {
            let mut low = estimate;
            let mut high = estimate + Decimal::ONE;
            while fits(high)? {
                low = high;
                high = (high * Decimal::TWO).min(limit);
                if low >= limit {
                    warn!(budget = %budget, limit = %limit, "Margin stays within budget up to the lot cap");
                    return Ok(limit);
                }
            }
            (low, high)
        } else {
            (Decimal::ONE, estimate)
        };

        while high - low > Decimal::ONE {
            let middle = ((low + high) / Decimal::TWO).floor();
            if fits(middle)? {
                low = middle;
            } else {
                high = middle;
            }
        }
        Ok(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Symbol;
    use rust_decimal_macros::dec;

    fn linear(per_unit: Decimal) -> impl Fn(&PositionGroup) -> Result<Decimal> {
        move |group: &PositionGroup| Ok(group.quantity().abs() * per_unit)
    }

    fn group(quantity: Decimal) -> PositionGroup {
        PositionGroup::naked(Symbol::equity("SPY"), quantity)
    }

    #[test]
    fn test_delta_grows_and_shrinks() {
        let held = group(dec!(10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(20500)), dec!(1000000), dec!(0));
        assert_eq!(resolver.for_delta(dec!(20520.5)).unwrap().number_of_lots, dec!(1));
        assert_eq!(resolver.for_delta(dec!(-20479.5)).unwrap().number_of_lots, dec!(-1));
        assert_eq!(resolver.for_delta(dec!(-205000)).unwrap().number_of_lots, dec!(-10));
    }

    #[test]
    fn test_lots_follow_short_side() {
        let held = group(dec!(-10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(16600)), dec!(1000000), dec!(0));
        let grow = resolver.for_delta(dec!(16616.6)).unwrap();
        assert_eq!(grow.number_of_lots, dec!(1));
        assert_eq!(apply_lots(&held, grow.number_of_lots).quantity(), dec!(-11));
    }

    #[test]
    fn test_negative_target_flips_side() {
        let held = group(dec!(10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(100)), dec!(1000000), dec!(0));
        let result = resolver.for_target_margin(dec!(-550)).unwrap();
        assert_eq!(result.number_of_lots, dec!(-15));
        assert_eq!(apply_lots(&held, result.number_of_lots).quantity(), dec!(-5));
    }

    #[test]
    fn test_zero_margin_cannot_be_sized() {
        let held = group(dec!(10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(0)), dec!(1000000), dec!(0));
        let result = resolver.for_delta(dec!(1000)).unwrap();
        assert_eq!(result.number_of_lots, dec!(0));
        assert!(!result.is_error);
        assert_eq!(result.reason, DELTA_CANNOT_BE_APPLIED);
    }

    #[test]
    fn test_zero_delta_on_free_strategy() {
        let held = group(dec!(10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(0)), dec!(1000000), dec!(0));
        let result = resolver.for_delta(dec!(0)).unwrap();
        assert_eq!(result.number_of_lots, dec!(0));
        assert!(!result.is_error);
        assert_ne!(result.reason, DELTA_CANNOT_BE_APPLIED);
    }

    #[test]
    fn test_search_stops_at_lot_cap() {
        // grows until two units, then stays flat
        let margin = |g: &PositionGroup| -> Result<Decimal> { Ok(g.quantity().abs().min(dec!(2))) };
        let held = group(dec!(1));
        let resolver = OrderQuantityResolver::new(&held, margin, dec!(1000000), dec!(0));
        let result = resolver.for_target_margin(dec!(5)).unwrap();
        assert_eq!(result.number_of_lots, Decimal::from(MAX_SEARCH_LOTS) - dec!(1));
    }

    #[test]
    fn test_nonlinear_margin_never_overshoots() {
        // fixed floor of 1000 plus 1 per unit
        let margin = |g: &PositionGroup| -> Result<Decimal> {
            let units = g.quantity().abs();
            Ok(if units.is_zero() { dec!(0) } else { dec!(1000) + units })
        };
        let held = group(dec!(1));
        let resolver = OrderQuantityResolver::new(&held, margin, dec!(1000000), dec!(0));
        let result = resolver.for_target_margin(dec!(500000)).unwrap();
        assert_eq!(result.number_of_lots, dec!(498999));
    }

    #[test]
    fn test_minimum_order_margin() {
        let held = group(dec!(10));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(100)), dec!(1000000), dec!(0.01));
        let result = resolver.for_delta(dec!(100)).unwrap();
        assert_eq!(result.number_of_lots, dec!(0));
        assert!(!result.is_error);
        assert!(!result.reason.is_empty());
    }

    #[test]
    fn test_target_and_delta_agree() {
        let held = group(dec!(7));
        let resolver = OrderQuantityResolver::new(&held, linear(dec!(250)), dec!(1000000), dec!(0));
        for delta in [dec!(-5000), dec!(-1750), dec!(-10), dec!(0), dec!(333), dec!(10000)] {
            let by_delta = resolver.for_delta(delta).unwrap();
            let by_target = resolver.for_target_margin(dec!(1750) + delta).unwrap();
            assert_eq!(by_delta, by_target);
        }
    }
}
