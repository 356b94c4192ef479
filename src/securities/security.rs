//! Security snapshots and the security registry

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::currency::DefaultCurrencyConversion;
use super::margin_model::BoxedBuyingPowerModel;
use crate::common::errors::{MarginError, Result};
use crate::common::traits::CurrencyConversion;
use crate::common::types::Symbol;

/// Default account currency for securities created without a conversion
pub const DEFAULT_CURRENCY: &str = "USD";

/// Price, holdings and margin capabilities of one security
///
/// A security bundles the pieces every margin computation needs: price,
/// contract multiplier, current holdings, the currency conversion into the
/// account currency and the per-security buying power model.
#[derive(Debug, Clone)]
pub struct Security {
    symbol: Symbol,
    price: Decimal,
    contract_multiplier: Decimal,
    holdings: Decimal,
    conversion: Arc<dyn CurrencyConversion>,
    buying_power_model: BoxedBuyingPowerModel,
}

impl Security {
    pub fn new(
        symbol: Symbol,
        price: Decimal,
        contract_multiplier: Decimal,
        buying_power_model: BoxedBuyingPowerModel,
    ) -> Self {
        Self {
            symbol,
            price,
            contract_multiplier,
            holdings: Decimal::ZERO,
            conversion: Arc::new(DefaultCurrencyConversion::identity(DEFAULT_CURRENCY)),
            buying_power_model,
        }
    }

    pub fn with_conversion(mut self, conversion: Arc<dyn CurrencyConversion>) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_holdings(mut self, quantity: Decimal) -> Self {
        self.holdings = quantity;
        self
    }

    /// Copy of this snapshot priced at `price`
    pub fn with_price(&self, price: Decimal) -> Self {
        let mut security = self.clone();
        security.price = price;
        security
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub fn contract_multiplier(&self) -> Decimal {
        self.contract_multiplier
    }

    pub fn holdings(&self) -> Decimal {
        self.holdings
    }

    pub fn set_holdings(&mut self, quantity: Decimal) {
        self.holdings = quantity;
    }

    pub fn quote_currency(&self) -> &str {
        self.conversion.source_currency()
    }

    pub fn conversion_rate(&self) -> Decimal {
        self.conversion.conversion_rate()
    }

    /// Convert a quote-currency amount into account currency
    pub fn convert(&self, amount: Decimal) -> Decimal {
        self.conversion.convert(amount)
    }

    /// Signed value of `quantity` in quote currency
    pub fn value_of(&self, quantity: Decimal) -> Decimal {
        quantity * self.contract_multiplier * self.price
    }

    /// Unsigned value of `quantity` in quote currency
    pub fn absolute_value_of(&self, quantity: Decimal) -> Decimal {
        self.value_of(quantity).abs()
    }

    /// Signed value of current holdings in account currency
    pub fn holdings_value(&self) -> Decimal {
        self.convert(self.value_of(self.holdings))
    }

    pub fn leverage(&self) -> Decimal {
        self.buying_power_model.leverage()
    }

    /// Replace the buying power model with one using `leverage`
    pub fn set_leverage(&mut self, leverage: Decimal) -> Result<()> {
        self.buying_power_model = self.buying_power_model.with_leverage(leverage)?;
        Ok(())
    }

    pub fn buying_power_model(&self) -> &BoxedBuyingPowerModel {
        &self.buying_power_model
    }

    pub fn set_buying_power_model(&mut self, model: BoxedBuyingPowerModel) {
        self.buying_power_model = model;
    }

    /// Initial margin for `quantity` of this security, in account currency
    pub fn initial_margin(&self, securities: &SecurityManager, quantity: Decimal) -> Result<Decimal> {
        self.buying_power_model
            .initial_margin(securities, self, quantity)
    }

    /// Maintenance margin for `quantity` of this security, in account currency
    pub fn maintenance_margin(
        &self,
        securities: &SecurityManager,
        quantity: Decimal,
    ) -> Result<Decimal> {
        self.buying_power_model
            .maintenance_margin(securities, self, quantity)
    }
}

/// Symbol-keyed registry of security snapshots
#[derive(Debug, Clone, Default)]
pub struct SecurityManager {
    securities: BTreeMap<Symbol, Security>,
}

impl SecurityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a security
    pub fn add(&mut self, security: Security) {
        self.securities.insert(security.symbol().clone(), security);
    }

    pub fn remove(&mut self, symbol: &Symbol) -> Option<Security> {
        self.securities.remove(symbol)
    }

    pub fn get(&self, symbol: &Symbol) -> Result<&Security> {
        self.securities
            .get(symbol)
            .ok_or_else(|| MarginError::SecurityNotFound(symbol.to_string()))
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Result<&mut Security> {
        self.securities
            .get_mut(symbol)
            .ok_or_else(|| MarginError::SecurityNotFound(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.securities.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Security> {
        self.securities.values()
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }
}
