//! Per-security buying power models

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::security::{Security, SecurityManager};
use crate::common::errors::{MarginError, Result};
use crate::config::types::MarginConfig;

/// Default leverage for equities (Reg T style 50% initial)
pub const DEFAULT_EQUITY_LEVERAGE: Decimal = dec!(2);

/// Default maintenance rate for equities
pub const DEFAULT_MAINTENANCE_RATE: Decimal = dec!(0.5);

/// Margin requirement of a single security
///
/// Every amount returned is in account currency. Models are immutable:
/// a leverage change produces a new model, so computations holding the
/// previous snapshot keep seeing the leverage they started with.
pub trait BuyingPowerModel: Send + Sync + std::fmt::Debug {
    /// Current leverage
    fn leverage(&self) -> Decimal;

    /// Copy of this model with a different leverage
    fn with_leverage(&self, leverage: Decimal) -> Result<BoxedBuyingPowerModel>;

    /// Margin required to open `quantity` of `security`
    ///
    /// # Arguments
    /// * `securities` - Snapshot used to look up related securities (e.g. an option's underlying)
    /// * `security` - The security being margined
    /// * `quantity` - Signed quantity
    fn initial_margin(
        &self,
        securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal>;

    /// Margin required to keep holding `quantity` of `security`
    fn maintenance_margin(
        &self,
        securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal>;
}

/// Shared buying power model for dynamic dispatch
pub type BoxedBuyingPowerModel = Arc<dyn BuyingPowerModel>;

/// Leverage based model used for equities
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityMarginModel {
    leverage: Decimal,
    maintenance_rate: Decimal,
    /// Fixed amount (quote currency) below which maintenance never falls
    maintenance_floor: Decimal,
}

impl SecurityMarginModel {
    pub fn new(leverage: Decimal, maintenance_rate: Decimal) -> Result<Self> {
        if leverage <= Decimal::ZERO {
            return Err(MarginError::InvalidLeverage(leverage));
        }
        Ok(Self {
            leverage,
            maintenance_rate,
            maintenance_floor: Decimal::ZERO,
        })
    }

    pub fn from_config(config: &MarginConfig) -> Result<Self> {
        Self::new(config.equity_leverage, config.equity_maintenance_rate)
    }

    pub fn with_maintenance_floor(mut self, floor: Decimal) -> Self {
        self.maintenance_floor = floor;
        self
    }

    pub fn maintenance_rate(&self) -> Decimal {
        self.maintenance_rate
    }

    pub fn into_boxed(self) -> BoxedBuyingPowerModel {
        Arc::new(self)
    }
}

impl Default for SecurityMarginModel {
    fn default() -> Self {
        Self {
            leverage: DEFAULT_EQUITY_LEVERAGE,
            maintenance_rate: DEFAULT_MAINTENANCE_RATE,
            maintenance_floor: Decimal::ZERO,
        }
    }
}

impl BuyingPowerModel for SecurityMarginModel {
    fn leverage(&self) -> Decimal {
        self.leverage
    }

    fn with_leverage(&self, leverage: Decimal) -> Result<BoxedBuyingPowerModel> {
        let model = Self::new(leverage, self.maintenance_rate)?
            .with_maintenance_floor(self.maintenance_floor);
        Ok(model.into_boxed())
    }

    fn initial_margin(
        &self,
        _securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal> {
        let value = security.absolute_value_of(quantity);
        Ok(security.convert(value / self.leverage))
    }

    fn maintenance_margin(
        &self,
        _securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal> {
        if quantity.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let value = security.absolute_value_of(quantity);
        let requirement = (value * self.maintenance_rate).max(self.maintenance_floor);
        Ok(security.convert(requirement))
    }
}
