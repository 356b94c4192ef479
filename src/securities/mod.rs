//! Securities: price snapshots, currency conversion and per-security margin models

mod currency;
mod margin_model;
mod option_margin;
mod security;

pub use currency::DefaultCurrencyConversion;
pub use margin_model::{
    BoxedBuyingPowerModel, BuyingPowerModel, SecurityMarginModel, DEFAULT_EQUITY_LEVERAGE,
    DEFAULT_MAINTENANCE_RATE,
};
pub use option_margin::{OptionMarginModel, NAKED_MINIMUM_RATE, NAKED_UNDERLYING_RATE};
pub use security::{Security, SecurityManager, DEFAULT_CURRENCY};
