use rust_decimal::Decimal;

use crate::common::traits::CurrencyConversion;

/// Fixed-rate conversion between a quote currency and the account currency
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultCurrencyConversion {
    source_currency: String,
    destination_currency: String,
    conversion_rate: Decimal,
}

impl DefaultCurrencyConversion {
    pub fn new(
        source_currency: impl Into<String>,
        destination_currency: impl Into<String>,
        conversion_rate: Decimal,
    ) -> Self {
        Self {
            source_currency: source_currency.into(),
            destination_currency: destination_currency.into(),
            conversion_rate,
        }
    }

    /// Conversion of a currency into itself (rate 1)
    pub fn identity(currency: impl Into<String>) -> Self {
        let currency = currency.into();
        Self::new(currency.clone(), currency, Decimal::ONE)
    }

    /// Update the rate from a fresh quote
    pub fn set_rate(&mut self, conversion_rate: Decimal) {
        self.conversion_rate = conversion_rate;
    }
}

impl CurrencyConversion for DefaultCurrencyConversion {
    fn source_currency(&self) -> &str {
        &self.source_currency
    }

    fn destination_currency(&self) -> &str {
        &self.destination_currency
    }

    fn conversion_rate(&self) -> Decimal {
        self.conversion_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identity_conversion() {
        let conversion = DefaultCurrencyConversion::identity("USD");
        assert_eq!(conversion.source_currency(), "USD");
        assert_eq!(conversion.destination_currency(), "USD");
        assert_eq!(conversion.convert(dec!(123.45)), dec!(123.45));
    }

    #[test]
    fn test_fixed_rate_conversion() {
        let mut conversion = DefaultCurrencyConversion::new("EUR", "USD", dec!(1.10));
        assert_eq!(conversion.convert(dec!(100)), dec!(110.00));
        conversion.set_rate(dec!(1.05));
        assert_eq!(conversion.convert(dec!(100)), dec!(105.00));
    }
}
