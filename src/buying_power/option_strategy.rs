use rust_decimal::Decimal;

use super::traits::PositionGroupBuyingPowerModel;
use crate::common::errors::{MarginError, Result};
use crate::portfolio::Portfolio;
use crate::positions::PositionGroup;
use crate::strategy::{SidedFormula, StrategyDefinition, StrategyId, StrategyLegs, OPTION_STRATEGY_CATALOG};

/// Margins a matched option strategy with its catalog formulas
///
/// Formulas are evaluated on one unit of the group, on the side it is
/// held, and scaled by the absolute group quantity.
#[derive(Debug, Clone, Copy)]
pub struct OptionStrategyPositionGroupBuyingPowerModel {
    strategy: StrategyId,
}

impl OptionStrategyPositionGroupBuyingPowerModel {
    pub fn new(strategy: StrategyId) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> StrategyId {
        self.strategy
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        group: &PositionGroup,
        formula: fn(&StrategyDefinition) -> &SidedFormula,
    ) -> Result<Decimal> {
        if group.strategy() != Some(self.strategy) {
            return Err(MarginError::invariant(format!(
                "{} model cannot margin a {} group",
                self.strategy,
                group.kind()
            )));
        }
        if group.quantity().is_zero() {
            return Ok(Decimal::ZERO);
        }

        let definition = OPTION_STRATEGY_CATALOG
            .get(self.strategy)
            .ok_or_else(|| MarginError::UnresolvableStrategy {
                strategy: self.strategy.name().to_string(),
                reason: "strategy is not in the catalog".to_string(),
            })?;

        let unit = group.unit_group();
        let legs = StrategyLegs::from_group(portfolio.securities(), &unit)?;
        let per_unit = formula(definition).evaluate(group.side(), &legs)?;
        Ok(per_unit * group.quantity().abs())
    }
}

fn initial_formula(definition: &StrategyDefinition) -> &SidedFormula {
    &definition.initial
}

fn maintenance_formula(definition: &StrategyDefinition) -> &SidedFormula {
    &definition.maintenance
}

impl PositionGroupBuyingPowerModel for OptionStrategyPositionGroupBuyingPowerModel {
    fn initial_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal> {
        self.evaluate(portfolio, group, initial_formula)
    }

    fn maintenance_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal> {
        self.evaluate(portfolio, group, maintenance_formula)
    }
}
