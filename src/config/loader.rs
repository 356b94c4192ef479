//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::EngineConfig;
use crate::common::errors::{MarginError, Result};

/// Environment variable prefix, e.g. `MARGIN__RESOLVER__TIE_BREAK`
pub const ENV_PREFIX: &str = "MARGIN";

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with MARGIN__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| MarginError::Configuration(e.to_string()))?;

    let engine: EngineConfig = config
        .try_deserialize()
        .map_err(|e| MarginError::Configuration(e.to_string()))?;

    validate(&engine)?;
    Ok(engine)
}

/// Load configuration from `.env` and the process environment only
pub fn load_from_env() -> Result<EngineConfig> {
    dotenvy::dotenv().ok();
    load_config(None)
}

fn validate(config: &EngineConfig) -> Result<()> {
    let margin = &config.margin;
    if margin.equity_leverage <= rust_decimal::Decimal::ZERO {
        return Err(MarginError::Configuration(format!(
            "equity_leverage must be positive, got {}",
            margin.equity_leverage
        )));
    }
    if margin.equity_maintenance_rate.is_sign_negative()
        || margin.naked_option_underlying_rate.is_sign_negative()
        || margin.naked_option_minimum_rate.is_sign_negative()
        || margin.minimum_order_margin_portfolio_percentage.is_sign_negative()
    {
        return Err(MarginError::Configuration(
            "margin rates cannot be negative".to_string(),
        ));
    }
    if config.account.currency.trim().is_empty() {
        return Err(MarginError::Configuration(
            "account currency cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.margin.equity_leverage, dec!(2));
    }

    #[test]
    fn test_rejects_non_positive_leverage() {
        let mut config = EngineConfig::default();
        config.margin.equity_leverage = dec!(0);
        assert!(matches!(
            validate(&config),
            Err(MarginError::Configuration(_))
        ));
    }
}
