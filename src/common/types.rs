//! Security identifiers shared by every component

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option right
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionRight::Call => write!(f, "C"),
            OptionRight::Put => write!(f, "P"),
        }
    }
}

/// Contract terms of a listed option
///
/// Field order drives the derived ordering: expiry, then strike, then right.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    pub expiry: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
}

impl OptionContract {
    pub fn new(right: OptionRight, strike: Decimal, expiry: NaiveDate) -> Self {
        Self {
            expiry,
            strike,
            right,
        }
    }

    /// Intrinsic value per share at the given underlying price
    pub fn intrinsic_value(&self, underlying_price: Decimal) -> Decimal {
        match self.right {
            OptionRight::Call => (underlying_price - self.strike).max(Decimal::ZERO),
            OptionRight::Put => (self.strike - underlying_price).max(Decimal::ZERO),
        }
    }

    /// Out-of-the-money amount per share at the given underlying price
    pub fn out_of_the_money_amount(&self, underlying_price: Decimal) -> Decimal {
        match self.right {
            OptionRight::Call => (self.strike - underlying_price).max(Decimal::ZERO),
            OptionRight::Put => (underlying_price - self.strike).max(Decimal::ZERO),
        }
    }
}

/// Security identifier
///
/// Equities carry only the ticker; options carry the ticker of their
/// underlying together with the contract terms. Equities sort before their
/// options.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub underlying: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<OptionContract>,
}

impl Symbol {
    /// Create an equity symbol
    pub fn equity(ticker: impl Into<String>) -> Self {
        Self {
            underlying: ticker.into().to_uppercase(),
            option: None,
        }
    }

    /// Create an option symbol on the given underlying ticker
    pub fn option(
        ticker: impl Into<String>,
        right: OptionRight,
        strike: Decimal,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            underlying: ticker.into().to_uppercase(),
            option: Some(OptionContract::new(right, strike, expiry)),
        }
    }

    pub fn is_option(&self) -> bool {
        self.option.is_some()
    }

    pub fn contract(&self) -> Option<&OptionContract> {
        self.option.as_ref()
    }

    /// Symbol of the underlying equity (itself for equities)
    pub fn underlying_symbol(&self) -> Symbol {
        Symbol::equity(self.underlying.clone())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.option {
            None => write!(f, "{}", self.underlying),
            Some(contract) => {
                let strike = (contract.strike * Decimal::from(1000)).trunc();
                write!(
                    f,
                    "{} {}{}{:0>8}",
                    self.underlying,
                    contract.expiry.format("%y%m%d"),
                    contract.right,
                    strike
                )
            }
        }
    }
}

/// Sign of a decimal as -1, 0 or 1
pub fn signum(value: Decimal) -> Decimal {
    if value.is_zero() {
        Decimal::ZERO
    } else if value.is_sign_negative() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    }
}
