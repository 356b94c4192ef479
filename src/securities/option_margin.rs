//! Naked option margin (CBOE style)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::margin_model::{BoxedBuyingPowerModel, BuyingPowerModel};
use super::security::{Security, SecurityManager};
use crate::common::errors::{MarginError, Result};
use crate::common::types::{OptionContract, OptionRight};
use crate::config::types::MarginConfig;

/// Share of the underlying value required on a naked short option
pub const NAKED_UNDERLYING_RATE: Decimal = dec!(0.20);

/// Minimum share of the underlying (calls) or strike (puts) on a naked short
pub const NAKED_MINIMUM_RATE: Decimal = dec!(0.10);

/// Margin model for a single option contract
///
/// - Long options are paid in full: requirement = premium value.
/// - Short options carry the premium plus
///   `max(20% of underlying - OTM amount, 10% of underlying (calls) or strike (puts))`.
///
/// Options are not leveraged.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMarginModel {
    underlying_rate: Decimal,
    minimum_rate: Decimal,
}

impl OptionMarginModel {
    pub fn new(underlying_rate: Decimal, minimum_rate: Decimal) -> Self {
        Self {
            underlying_rate,
            minimum_rate,
        }
    }

    pub fn from_config(config: &MarginConfig) -> Self {
        Self::new(
            config.naked_option_underlying_rate,
            config.naked_option_minimum_rate,
        )
    }

    pub fn into_boxed(self) -> BoxedBuyingPowerModel {
        Arc::new(self)
    }

    /// Per-share requirement of a naked short option (quote currency)
    ///
    /// # Arguments
    /// * `contract` - Option terms
    /// * `premium` - Option price per share
    /// * `underlying_price` - Price of the underlying
    pub fn naked_short_requirement(
        &self,
        contract: &OptionContract,
        premium: Decimal,
        underlying_price: Decimal,
    ) -> Decimal {
        let otm = contract.out_of_the_money_amount(underlying_price);
        let minimum_base = match contract.right {
            OptionRight::Call => underlying_price,
            OptionRight::Put => contract.strike,
        };
        let requirement = (self.underlying_rate * underlying_price - otm)
            .max(self.minimum_rate * minimum_base);
        premium + requirement
    }

    fn requirement(
        &self,
        securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal> {
        if quantity.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let contract = security.symbol().contract().ok_or_else(|| {
            MarginError::invariant(format!(
                "option margin model bound to non-option {}",
                security.symbol()
            ))
        })?;

        if quantity.is_sign_positive() {
            return Ok(security.convert(security.absolute_value_of(quantity)));
        }

        let underlying = securities.get(&security.symbol().underlying_symbol())?;
        let per_share =
            self.naked_short_requirement(contract, security.price(), underlying.price());
        let requirement = per_share * security.contract_multiplier() * quantity.abs();
        Ok(security.convert(requirement))
    }
}

impl Default for OptionMarginModel {
    fn default() -> Self {
        Self::new(NAKED_UNDERLYING_RATE, NAKED_MINIMUM_RATE)
    }
}

impl BuyingPowerModel for OptionMarginModel {
    fn leverage(&self) -> Decimal {
        Decimal::ONE
    }

    fn with_leverage(&self, leverage: Decimal) -> Result<BoxedBuyingPowerModel> {
        if leverage != Decimal::ONE {
            return Err(MarginError::InvalidLeverage(leverage));
        }
        Ok(self.clone().into_boxed())
    }

    fn initial_margin(
        &self,
        securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal> {
        self.requirement(securities, security, quantity)
    }

    fn maintenance_margin(
        &self,
        securities: &SecurityManager,
        security: &Security,
        quantity: Decimal,
    ) -> Result<Decimal> {
        self.requirement(securities, security, quantity)
    }
}
