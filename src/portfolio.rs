//! Account state: cash, securities and portfolio-wide margin

use rust_decimal::Decimal;
use tracing::debug;

use crate::buying_power::PositionGroupBuyingPowerModel;
use crate::common::errors::Result;
use crate::common::types::Symbol;
use crate::config::types::EngineConfig;
use crate::orders::{group_from_orders, Order};
use crate::positions::{PositionCollection, PositionGroup, PositionGroupResolver};
use crate::securities::{SecurityManager, DEFAULT_CURRENCY};

/// Cash plus holdings, margined through resolved position groups
///
/// The portfolio never caches groups: every margin query resolves the
/// holdings it is asked about, so price and holding updates take effect
/// immediately.
#[derive(Debug, Clone)]
pub struct Portfolio {
    cash: Decimal,
    account_currency: String,
    securities: SecurityManager,
    resolver: PositionGroupResolver,
    minimum_order_margin_portfolio_percentage: Decimal,
}

impl Portfolio {
    /// Portfolio with default resolver settings and no minimum order margin
    pub fn new(cash: Decimal, securities: SecurityManager) -> Self {
        Self {
            cash,
            account_currency: DEFAULT_CURRENCY.to_string(),
            securities,
            resolver: PositionGroupResolver::default(),
            minimum_order_margin_portfolio_percentage: Decimal::ZERO,
        }
    }

    pub fn from_config(cash: Decimal, securities: SecurityManager, config: &EngineConfig) -> Self {
        Self {
            cash,
            account_currency: config.account.currency.clone(),
            securities,
            resolver: PositionGroupResolver::new(config.resolver),
            minimum_order_margin_portfolio_percentage: config
                .margin
                .minimum_order_margin_portfolio_percentage,
        }
    }

    pub fn with_account_currency(mut self, currency: impl Into<String>) -> Self {
        self.account_currency = currency.into();
        self
    }

    pub fn with_resolver(mut self, resolver: PositionGroupResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn set_cash(&mut self, cash: Decimal) {
        self.cash = cash;
    }

    pub fn account_currency(&self) -> &str {
        &self.account_currency
    }

    pub fn securities(&self) -> &SecurityManager {
        &self.securities
    }

    pub fn securities_mut(&mut self) -> &mut SecurityManager {
        &mut self.securities
    }

    pub fn resolver(&self) -> &PositionGroupResolver {
        &self.resolver
    }

    pub fn minimum_order_margin_portfolio_percentage(&self) -> Decimal {
        self.minimum_order_margin_portfolio_percentage
    }

    pub fn set_holdings(&mut self, symbol: &Symbol, quantity: Decimal) -> Result<()> {
        self.securities.get_mut(symbol)?.set_holdings(quantity);
        Ok(())
    }

    pub fn set_price(&mut self, symbol: &Symbol, price: Decimal) -> Result<()> {
        self.securities.get_mut(symbol)?.set_price(price);
        Ok(())
    }

    /// Flat view of the current holdings
    pub fn positions(&self) -> PositionCollection {
        PositionCollection::from_holdings(&self.securities)
    }

    /// Current holdings resolved into margin groups
    pub fn position_groups(&self) -> Result<Vec<PositionGroup>> {
        self.resolver.resolve(&self.positions(), &self.securities)
    }

    /// Group formed by `orders`, matched to a strategy when the orders
    /// form exactly one
    pub fn contemplated_group(&self, orders: &[Order]) -> Result<PositionGroup> {
        let group = group_from_orders(orders)?;
        let positions: PositionCollection = group
            .positions()
            .iter()
            .map(|p| (p.symbol().clone(), p.quantity()))
            .collect();
        let mut resolved = self.resolver.resolve(&positions, &self.securities)?;
        match resolved.pop() {
            Some(single) if resolved.is_empty() => Ok(single),
            _ => Ok(group),
        }
    }

    /// Cash plus the marked value of every holding, in account currency
    pub fn total_portfolio_value(&self) -> Decimal {
        self.cash
            + self
                .securities
                .iter()
                .map(|security| security.holdings_value())
                .sum::<Decimal>()
    }

    /// Maintenance margin of `positions` once resolved into groups
    pub fn margin_for_positions(&self, positions: &PositionCollection) -> Result<Decimal> {
        let groups = self.resolver.resolve(positions, &self.securities)?;
        groups.iter().try_fold(Decimal::ZERO, |total, group| -> Result<Decimal> {
            let margin = group.buying_power_model().maintenance_margin(self, group)?;
            debug!(kind = %group.kind(), quantity = %group.quantity(), margin = %margin, "Group margin");
            Ok(total + margin)
        })
    }

    /// Initial margin of `positions` once resolved into groups
    pub fn initial_margin_for_positions(&self, positions: &PositionCollection) -> Result<Decimal> {
        let groups = self.resolver.resolve(positions, &self.securities)?;
        groups.iter().try_fold(Decimal::ZERO, |total, group| -> Result<Decimal> {
            Ok(total + group.buying_power_model().initial_margin(self, group)?)
        })
    }

    /// Maintenance margin of all current holdings
    pub fn total_margin_used(&self) -> Result<Decimal> {
        self.margin_for_positions(&self.positions())
    }

    /// Portfolio value not yet reserved as margin
    pub fn margin_remaining(&self) -> Result<Decimal> {
        Ok(self.total_portfolio_value() - self.total_margin_used()?)
    }
}
