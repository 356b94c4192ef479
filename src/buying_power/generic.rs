use rust_decimal::Decimal;

use super::traits::PositionGroupBuyingPowerModel;
use crate::common::errors::Result;
use crate::portfolio::Portfolio;
use crate::positions::PositionGroup;
use crate::securities::Security;

/// Margins a group as the sum of its legs' per-security margins
///
/// Used for naked positions and for groups matching no strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityPositionGroupBuyingPowerModel;

impl SecurityPositionGroupBuyingPowerModel {
    pub fn new() -> Self {
        Self
    }

    fn sum_legs<F>(&self, portfolio: &Portfolio, group: &PositionGroup, margin: F) -> Result<Decimal>
    where
        F: Fn(&Security, Decimal) -> Result<Decimal>,
    {
        group.positions().iter().try_fold(Decimal::ZERO, |total, position| -> Result<Decimal> {
            let security = portfolio.securities().get(position.symbol())?;
            Ok(total + margin(security, position.quantity())?)
        })
    }
}

impl PositionGroupBuyingPowerModel for SecurityPositionGroupBuyingPowerModel {
    fn initial_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal> {
        self.sum_legs(portfolio, group, |security, quantity| {
            security.initial_margin(portfolio.securities(), quantity)
        })
    }

    fn maintenance_margin(&self, portfolio: &Portfolio, group: &PositionGroup) -> Result<Decimal> {
        self.sum_legs(portfolio, group, |security, quantity| {
            security.maintenance_margin(portfolio.securities(), quantity)
        })
    }
}
