//! Trait definitions shared across the engine

use rust_decimal::Decimal;

/// Converts amounts from a security's quote currency into the account
/// currency
///
/// The engine never computes rates itself; implementations are fed by
/// whoever owns the price snapshot.
pub trait CurrencyConversion: Send + Sync + std::fmt::Debug {
    /// Currency amounts are quoted in
    fn source_currency(&self) -> &str;

    /// Currency amounts are converted into
    fn destination_currency(&self) -> &str;

    /// Multiplier taking one unit of source currency into destination currency
    fn conversion_rate(&self) -> Decimal;

    /// Convert an amount from source to destination currency
    fn convert(&self, amount: Decimal) -> Decimal {
        amount * self.conversion_rate()
    }
}
