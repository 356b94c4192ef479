//! JSON portfolio snapshots
//!
//! A snapshot is the full input of one margin evaluation: cash, prices,
//! holdings and currency rates of every security involved.
//!
//! ```json
//! {
//!   "cash": "959000",
//!   "securities": [
//!     { "symbol": { "underlying": "SPY" }, "price": "410", "holdings": "100" },
//!     {
//!       "symbol": {
//!         "underlying": "SPY",
//!         "option": { "expiry": "2023-05-19", "strike": "300", "right": "call" }
//!       },
//!       "price": "112",
//!       "holdings": "-1"
//!     }
//!   ]
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::common::errors::{MarginError, Result};
use crate::common::types::Symbol;
use crate::config::types::EngineConfig;
use crate::portfolio::Portfolio;
use crate::securities::{
    DefaultCurrencyConversion, OptionMarginModel, Security, SecurityManager, SecurityMarginModel,
};

/// Shares per listed equity option contract
pub const DEFAULT_OPTION_MULTIPLIER: Decimal = rust_decimal_macros::dec!(100);

fn default_conversion_rate() -> Decimal {
    Decimal::ONE
}

/// One security of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    pub symbol: Symbol,
    pub price: Decimal,

    /// Defaults to 100 for options and 1 for equities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_multiplier: Option<Decimal>,

    #[serde(default)]
    pub holdings: Decimal,

    /// Quote currency; the account currency when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_currency: Option<String>,

    /// Account currency per unit of quote currency
    #[serde(default = "default_conversion_rate")]
    pub conversion_rate: Decimal,

    /// Overrides the configured equity leverage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<Decimal>,
}

impl SecuritySnapshot {
    fn contract_multiplier(&self) -> Decimal {
        self.contract_multiplier.unwrap_or(if self.symbol.is_option() {
            DEFAULT_OPTION_MULTIPLIER
        } else {
            Decimal::ONE
        })
    }

    fn into_security(self, account_currency: &str, config: &EngineConfig) -> Result<Security> {
        let model = if self.symbol.is_option() {
            OptionMarginModel::from_config(&config.margin).into_boxed()
        } else {
            SecurityMarginModel::from_config(&config.margin)?.into_boxed()
        };
        let quote_currency = self
            .quote_currency
            .clone()
            .unwrap_or_else(|| account_currency.to_string());

        let mut security = Security::new(
            self.symbol.clone(),
            self.price,
            self.contract_multiplier(),
            model,
        )
        .with_conversion(Arc::new(DefaultCurrencyConversion::new(
            quote_currency,
            account_currency,
            self.conversion_rate,
        )))
        .with_holdings(self.holdings);

        if let Some(leverage) = self.leverage {
            security.set_leverage(leverage)?;
        }
        Ok(security)
    }
}

/// Cash and securities of an account at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,

    /// The configured account currency when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_currency: Option<String>,

    #[serde(default)]
    pub securities: Vec<SecuritySnapshot>,
}

impl PortfolioSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check prices, rates and that every option's underlying is present
    pub fn validate(&self) -> Result<()> {
        let mut symbols = BTreeSet::new();
        for security in &self.securities {
            if !symbols.insert(&security.symbol) {
                return Err(MarginError::Snapshot(format!(
                    "security {} listed twice",
                    security.symbol
                )));
            }
            if security.price.is_sign_negative() {
                return Err(MarginError::Snapshot(format!(
                    "negative price {} for {}",
                    security.price, security.symbol
                )));
            }
            if security.conversion_rate <= Decimal::ZERO {
                return Err(MarginError::Snapshot(format!(
                    "conversion rate of {} must be positive, got {}",
                    security.symbol, security.conversion_rate
                )));
            }
        }

        for security in self.securities.iter().filter(|s| s.symbol.is_option()) {
            if !symbols.contains(&security.symbol.underlying_symbol()) {
                return Err(MarginError::Snapshot(format!(
                    "option {} has no underlying {} in the snapshot",
                    security.symbol, security.symbol.underlying
                )));
            }
        }
        Ok(())
    }

    /// Build a portfolio using the configured margin models
    pub fn into_portfolio(self, config: &EngineConfig) -> Result<Portfolio> {
        self.validate()?;

        let account_currency = self
            .account_currency
            .unwrap_or_else(|| config.account.currency.clone());

        let mut securities = SecurityManager::new();
        for snapshot in self.securities {
            securities.add(snapshot.into_security(&account_currency, config)?);
        }

        info!(
            securities = securities.len(),
            cash = %self.cash,
            currency = %account_currency,
            "Loaded portfolio snapshot"
        );

        Ok(Portfolio::from_config(self.cash, securities, config)
            .with_account_currency(account_currency))
    }
}
