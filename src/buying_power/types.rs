use rust_decimal::Decimal;
use serde::Serialize;

use crate::positions::Position;

/// Answer to "can the portfolio afford this order?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SufficientBuyingPowerResult {
    pub is_sufficient: bool,
    /// Empty when sufficient
    pub reason: String,
}

impl SufficientBuyingPowerResult {
    pub fn sufficient() -> Self {
        Self {
            is_sufficient: true,
            reason: String::new(),
        }
    }

    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self {
            is_sufficient: false,
            reason: reason.into(),
        }
    }
}

/// Margin before and after a contemplated order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservedBuyingPowerImpact {
    /// Margin currently reserved for the affected holdings
    pub current: Decimal,
    /// Margin the same holdings would reserve after the order
    pub contemplated: Decimal,
    /// `contemplated - current`
    pub delta: Decimal,
    /// Positions the order would add
    pub contemplated_changes: Vec<Position>,
}

impl ReservedBuyingPowerImpact {
    pub fn new(current: Decimal, contemplated: Decimal, contemplated_changes: Vec<Position>) -> Self {
        Self {
            current,
            contemplated,
            delta: contemplated - current,
            contemplated_changes,
        }
    }
}

/// Order size, in lots of the group, fitting a margin budget
///
/// Lots are counted along the side the group is held on: positive lots
/// grow the holding, negative lots shrink it (or flip it past zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaximumLotsResult {
    pub number_of_lots: Decimal,
    pub is_error: bool,
    pub reason: String,
}

impl MaximumLotsResult {
    pub fn lots(number_of_lots: Decimal) -> Self {
        Self {
            number_of_lots,
            is_error: false,
            reason: String::new(),
        }
    }

    /// No order, with an explanation that is not an error
    pub fn zero(reason: impl Into<String>) -> Self {
        Self {
            number_of_lots: Decimal::ZERO,
            is_error: false,
            reason: reason.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            number_of_lots: Decimal::ZERO,
            is_error: true,
            reason: reason.into(),
        }
    }
}
