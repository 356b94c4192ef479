use rust_decimal::Decimal;
use std::collections::BTreeSet;

use super::quantity::OrderQuantityResolver;
use super::types::{MaximumLotsResult, ReservedBuyingPowerImpact, SufficientBuyingPowerResult};
use crate::common::errors::{MarginError, Result};
use crate::orders::Order;
use crate::portfolio::Portfolio;
use crate::positions::{PositionCollection, PositionGroup};

/// Margin and affordability of a position group
///
/// Implementors only provide the group's initial and maintenance margin;
/// affordability checks and order sizing are derived from those.
pub trait PositionGroupBuyingPowerModel: Send + Sync + std::fmt::Debug {
    /// Margin required to open `group`, in account currency
    fn initial_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal>;

    /// Margin required to keep holding `group`, in account currency
    fn maintenance_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal>;

    /// Initial margin of `group` resized to `quantity` units
    fn initial_margin_requirement(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        quantity: Decimal,
    ) -> Result<Decimal> {
        self.initial_margin(portfolio, &group.with_quantity(quantity))
    }

    /// Buying power currently reserved by a held group
    fn reserved_buying_power_for_group(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
    ) -> Result<Decimal> {
        self.maintenance_margin(portfolio, group)
    }

    /// Buying power available for reaching `group`, the position a trade
    /// would end in
    ///
    /// When `group` holds the legs of a held group on the opposite side, the
    /// trade frees what that group reserves before the new side is opened,
    /// so its reserved buying power counts twice on top of the margin
    /// remaining. Growing a held group or ending flat leaves the margin
    /// remaining.
    fn position_group_buying_power(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
    ) -> Result<Decimal> {
        let remaining = portfolio.margin_remaining()?;
        if group.quantity().is_zero() {
            return Ok(remaining);
        }
        for held in portfolio.position_groups()? {
            if matches!(group.proportion_of(&held), Some(k) if k < Decimal::ZERO) {
                let reserved = held
                    .buying_power_model()
                    .reserved_buying_power_for_group(portfolio, &held)?;
                return Ok(remaining + reserved * Decimal::TWO);
            }
        }
        Ok(remaining)
    }

    /// Margin of the held groups the order touches, before and after the order
    ///
    /// Every held group sharing a symbol with the order is priced whole,
    /// including legs the order does not trade. The contemplated side
    /// resolves those positions plus the order from scratch, so an order
    /// that breaks a strategy apart is priced on what remains.
    ///
    /// # Arguments
    /// * `portfolio` - Current holdings and prices
    /// * `group` - Contemplated group formed by `orders`
    /// * `orders` - Orders covering exactly the symbols of `group`
    fn reserved_buying_power_impact(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        orders: &[Order],
    ) -> Result<ReservedBuyingPowerImpact> {
        validate_orders(group, orders)?;
        let held = held_groups_touching(portfolio, group)?;
        impact_on_held_groups(portfolio, group, &held)
    }

    /// Whether the portfolio can afford the order
    ///
    /// Orders that shrink a held group without flipping it are always
    /// affordable; otherwise the margin increase must fit in the margin
    /// remaining.
    fn has_sufficient_buying_power_for_order(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        orders: &[Order],
    ) -> Result<SufficientBuyingPowerResult> {
        validate_orders(group, orders)?;
        let held = held_groups_touching(portfolio, group)?;

        if is_reduction(&held, group) {
            return Ok(SufficientBuyingPowerResult::sufficient());
        }

        let impact = impact_on_held_groups(portfolio, group, &held)?;
        let free_margin = portfolio.margin_remaining()?;
        if impact.delta <= free_margin {
            return Ok(SufficientBuyingPowerResult::sufficient());
        }

        let ids = orders
            .iter()
            .map(|o| o.id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(SufficientBuyingPowerResult::insufficient(format!(
            "Id: {}, Maintenance Margin Delta: {}, Free Margin: {}",
            ids,
            impact.delta.round_dp(2).normalize(),
            free_margin.round_dp(2).normalize()
        )))
    }

    /// Largest order changing the group's margin by at most `delta_buying_power`
    fn maximum_lots_for_delta_buying_power(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        delta_buying_power: Decimal,
        minimum_order_margin_portfolio_percentage: Decimal,
    ) -> Result<MaximumLotsResult> {
        OrderQuantityResolver::new(
            group,
            |g: &PositionGroup| self.maintenance_margin(portfolio, g),
            portfolio.total_portfolio_value(),
            minimum_order_margin_portfolio_percentage,
        )
        .for_delta(delta_buying_power)
    }

    /// Largest order bringing the group's margin to at most
    /// `target_percentage` of portfolio value
    fn maximum_lots_for_target_buying_power(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        target_percentage: Decimal,
        minimum_order_margin_portfolio_percentage: Decimal,
    ) -> Result<MaximumLotsResult> {
        OrderQuantityResolver::new(
            group,
            |g: &PositionGroup| self.maintenance_margin(portfolio, g),
            portfolio.total_portfolio_value(),
            minimum_order_margin_portfolio_percentage,
        )
        .for_target_percentage(target_percentage)
    }
}

/// Boxed group model for dynamic dispatch
pub type BoxedPositionGroupBuyingPowerModel = Box<dyn PositionGroupBuyingPowerModel>;

/// Orders must trade exactly the symbols of the group they describe
fn validate_orders(group: &PositionGroup, orders: &[Order]) -> Result<()> {
    let group_symbols: BTreeSet<_> = group.symbols().collect();
    let order_symbols: BTreeSet<_> = orders.iter().map(|o| &o.symbol).collect();
    if group_symbols != order_symbols {
        return Err(MarginError::invariant(format!(
            "orders trade {} symbols that do not match the {} symbols of the position group",
            order_symbols.len(),
            group_symbols.len()
        )));
    }
    Ok(())
}

/// Held groups sharing at least one symbol with `group`
fn held_groups_touching(portfolio: &Portfolio, group: &PositionGroup) -> Result<Vec<PositionGroup>> {
    Ok(portfolio
        .position_groups()?
        .into_iter()
        .filter(|held| held.overlaps(group))
        .collect())
}

fn impact_on_held_groups(
    portfolio: &Portfolio,
    group: &PositionGroup,
    held: &[PositionGroup],
) -> Result<ReservedBuyingPowerImpact> {
    let current = held.iter().try_fold(Decimal::ZERO, |total, existing| -> Result<Decimal> {
        let reserved = existing
            .buying_power_model()
            .reserved_buying_power_for_group(portfolio, existing)?;
        Ok(total + reserved)
    })?;

    let mut holdings = PositionCollection::new();
    for position in held.iter().flat_map(|existing| existing.positions()) {
        holdings.add_position(position);
    }
    let contemplated = portfolio.margin_for_positions(&holdings.combined_with(group.positions()))?;

    Ok(ReservedBuyingPowerImpact::new(
        current,
        contemplated,
        group.positions().to_vec(),
    ))
}

/// The order trades the legs of one held group, in proportion, against it
/// and by no more than the group holds
fn is_reduction(held: &[PositionGroup], group: &PositionGroup) -> bool {
    held.iter().any(|existing| {
        matches!(
            group.proportion_of(existing),
            Some(k) if k < Decimal::ZERO && k >= -Decimal::ONE
        )
    })
}
