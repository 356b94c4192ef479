//! Error types for the margin engine

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using our MarginError
pub type Result<T> = std::result::Result<T, MarginError>;

/// Main error type for margin computations
///
/// Insufficient buying power and zero-margin sizing are reported through
/// result types, never through this enum.
#[derive(Error, Debug)]
pub enum MarginError {
    /// Group and order disagree, or a partition failed to account for
    /// every unit of quantity
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Positions could not be matched to the requested strategy
    #[error("Unable to resolve strategy {strategy}: {reason}")]
    UnresolvableStrategy { strategy: String, reason: String },

    /// The snapshot has no security for a symbol that is held or ordered
    #[error("Security not found: {0}")]
    SecurityNotFound(String),

    /// Leverage must be strictly positive
    #[error("Invalid leverage: {0}")]
    InvalidLeverage(Decimal),

    /// Quantity that cannot be used (e.g. fractional lots)
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Portfolio snapshot errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarginError {
    /// Fatal errors mean the engine state is inconsistent and the caller
    /// should stop; non-fatal ones have a defined fallback.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MarginError::UnresolvableStrategy { .. })
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        MarginError::InvariantViolation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        let err = MarginError::UnresolvableStrategy {
            strategy: "Covered Call".to_string(),
            reason: "no call leg".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(MarginError::invariant("leak").is_fatal());
    }

    #[test]
    fn test_display() {
        let err = MarginError::InvalidLeverage(Decimal::ZERO);
        assert_eq!(err.to_string(), "Invalid leverage: 0");
    }
}
