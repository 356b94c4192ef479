//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Account-level settings
    #[serde(default)]
    pub account: AccountConfig,
    /// Default margin parameters for newly created securities
    #[serde(default)]
    pub margin: MarginConfig,
    /// Strategy matching behaviour
    #[serde(default)]
    pub resolver: ResolverSettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Currency every margin value is reported in
    #[serde(default = "default_account_currency")]
    pub currency: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            currency: default_account_currency(),
        }
    }
}

fn default_account_currency() -> String {
    "USD".to_string()
}

/// Margin model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginConfig {
    /// Leverage applied to equities (initial margin = value / leverage)
    #[serde(default = "default_equity_leverage")]
    pub equity_leverage: Decimal,
    /// Fraction of position value held as maintenance margin
    #[serde(default = "default_equity_maintenance_rate")]
    pub equity_maintenance_rate: Decimal,
    /// Share of underlying value required on a naked short option
    #[serde(default = "default_naked_underlying_rate")]
    pub naked_option_underlying_rate: Decimal,
    /// Minimum share of underlying (calls) or strike (puts) on a naked short option
    #[serde(default = "default_naked_minimum_rate")]
    pub naked_option_minimum_rate: Decimal,
    /// Orders moving margin by less than this share of portfolio value are skipped
    #[serde(default)]
    pub minimum_order_margin_portfolio_percentage: Decimal,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            equity_leverage: default_equity_leverage(),
            equity_maintenance_rate: default_equity_maintenance_rate(),
            naked_option_underlying_rate: default_naked_underlying_rate(),
            naked_option_minimum_rate: default_naked_minimum_rate(),
            minimum_order_margin_portfolio_percentage: Decimal::ZERO,
        }
    }
}

fn default_equity_leverage() -> Decimal {
    dec!(2)
}

fn default_equity_maintenance_rate() -> Decimal {
    dec!(0.5)
}

fn default_naked_underlying_rate() -> Decimal {
    dec!(0.20)
}

fn default_naked_minimum_rate() -> Decimal {
    dec!(0.10)
}

/// How the resolver orders strategies that explain the same legs equally well
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earlier catalog entries win
    #[default]
    CatalogOrder,
    /// Later catalog entries win
    ReverseCatalogOrder,
}

/// Strategy resolver settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Report a match on its template side (positive quantity) when both
    /// sides of two definitions explain the same positions
    #[serde(default = "default_true")]
    pub prefer_template_side: bool,
    /// Final tie-break between strategies
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            prefer_template_side: true,
            tie_break: TieBreak::CatalogOrder,
        }
    }
}

fn default_true() -> bool {
    true
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
