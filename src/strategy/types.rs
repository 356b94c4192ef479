use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::formulas::StrategyLegs;
use crate::common::errors::Result;
use crate::common::types::{OptionContract, OptionRight};

/// Recognized option strategies, in catalog declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyId {
    CoveredCall,
    CoveredPut,
    BearCallSpread,
    BearPutSpread,
    BullCallSpread,
    BullPutSpread,
    Straddle,
    Strangle,
    ButterflyCall,
    ShortButterflyCall,
    ButterflyPut,
    ShortButterflyPut,
    CallCalendarSpread,
    PutCalendarSpread,
    IronCondor,
}

impl StrategyId {
    pub const ALL: [StrategyId; 15] = [
        StrategyId::CoveredCall,
        StrategyId::CoveredPut,
        StrategyId::BearCallSpread,
        StrategyId::BearPutSpread,
        StrategyId::BullCallSpread,
        StrategyId::BullPutSpread,
        StrategyId::Straddle,
        StrategyId::Strangle,
        StrategyId::ButterflyCall,
        StrategyId::ShortButterflyCall,
        StrategyId::ButterflyPut,
        StrategyId::ShortButterflyPut,
        StrategyId::CallCalendarSpread,
        StrategyId::PutCalendarSpread,
        StrategyId::IronCondor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyId::CoveredCall => "Covered Call",
            StrategyId::CoveredPut => "Covered Put",
            StrategyId::BearCallSpread => "Bear Call Spread",
            StrategyId::BearPutSpread => "Bear Put Spread",
            StrategyId::BullCallSpread => "Bull Call Spread",
            StrategyId::BullPutSpread => "Bull Put Spread",
            StrategyId::Straddle => "Straddle",
            StrategyId::Strangle => "Strangle",
            StrategyId::ButterflyCall => "Butterfly Call",
            StrategyId::ShortButterflyCall => "Short Butterfly Call",
            StrategyId::ButterflyPut => "Butterfly Put",
            StrategyId::ShortButterflyPut => "Short Butterfly Put",
            StrategyId::CallCalendarSpread => "Call Calendar Spread",
            StrategyId::PutCalendarSpread => "Put Calendar Spread",
            StrategyId::IronCondor => "Iron Condor",
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which way round a strategy is held
///
/// A positive group quantity holds the legs as declared in the template, a
/// negative one holds every leg with its sign flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategySide {
    Template,
    Inverted,
}

impl StrategySide {
    pub fn of(quantity: Decimal) -> Self {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            StrategySide::Inverted
        } else {
            StrategySide::Template
        }
    }

    pub fn sign(&self) -> Decimal {
        match self {
            StrategySide::Template => Decimal::ONE,
            StrategySide::Inverted => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Strike constraint relative to previously matched option legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeRule {
    Any,
    SameAs(usize),
    Above(usize),
    Below(usize),
    /// Above `middle` by exactly the distance between `low` and `middle`
    Equidistant { low: usize, middle: usize },
}

impl StrikeRule {
    /// `legs` holds the contracts of the option legs matched so far, in
    /// template order
    pub fn accepts(&self, strike: Decimal, legs: &[&OptionContract]) -> bool {
        let strike_of = |index: usize| legs.get(index).map(|c| c.strike);
        match *self {
            StrikeRule::Any => true,
            StrikeRule::SameAs(i) => strike_of(i).is_some_and(|s| strike == s),
            StrikeRule::Above(i) => strike_of(i).is_some_and(|s| strike > s),
            StrikeRule::Below(i) => strike_of(i).is_some_and(|s| strike < s),
            StrikeRule::Equidistant { low, middle } => match (strike_of(low), strike_of(middle)) {
                (Some(l), Some(m)) => strike > m && strike - m == m - l,
                _ => false,
            },
        }
    }
}

/// Expiry constraint relative to previously matched option legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryRule {
    Any,
    SameAs(usize),
    After(usize),
    Before(usize),
}

impl ExpiryRule {
    pub fn accepts(&self, contract: &OptionContract, legs: &[&OptionContract]) -> bool {
        let expiry_of = |index: usize| legs.get(index).map(|c| c.expiry);
        match *self {
            ExpiryRule::Any => true,
            ExpiryRule::SameAs(i) => expiry_of(i).is_some_and(|e| contract.expiry == e),
            ExpiryRule::After(i) => expiry_of(i).is_some_and(|e| contract.expiry > e),
            ExpiryRule::Before(i) => expiry_of(i).is_some_and(|e| contract.expiry < e),
        }
    }
}

/// One leg of a strategy template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegTemplate {
    Option {
        right: OptionRight,
        /// Signed contracts per strategy unit
        ratio: i64,
        strike: StrikeRule,
        expiry: ExpiryRule,
    },
    /// Underlying shares per unit: `direction` times the option contract
    /// multiplier. Declared after every option leg.
    Underlying { direction: i64 },
}

impl LegTemplate {
    pub fn option(right: OptionRight, ratio: i64, strike: StrikeRule, expiry: ExpiryRule) -> Self {
        LegTemplate::Option {
            right,
            ratio,
            strike,
            expiry,
        }
    }

    pub fn is_underlying(&self) -> bool {
        matches!(self, LegTemplate::Underlying { .. })
    }
}

/// Per-unit margin formula in account currency
pub type MarginFormulaFn = fn(&StrategyLegs<'_>) -> Result<Decimal>;

/// Formula pair selected by the side the strategy is held on
#[derive(Clone, Copy)]
pub struct SidedFormula {
    pub template: MarginFormulaFn,
    pub inverted: MarginFormulaFn,
}

impl SidedFormula {
    pub fn new(template: MarginFormulaFn, inverted: MarginFormulaFn) -> Self {
        Self { template, inverted }
    }

    /// Same formula on both sides; the formula reads leg signs itself
    pub fn symmetric(formula: MarginFormulaFn) -> Self {
        Self::new(formula, formula)
    }

    pub fn evaluate(&self, side: StrategySide, legs: &StrategyLegs<'_>) -> Result<Decimal> {
        match side {
            StrategySide::Template => (self.template)(legs),
            StrategySide::Inverted => (self.inverted)(legs),
        }
    }
}

impl std::fmt::Debug for SidedFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SidedFormula")
    }
}

/// Catalog entry describing how to recognize and margin a strategy
#[derive(Debug, Clone)]
pub struct StrategyDefinition {
    pub id: StrategyId,
    pub legs: Vec<LegTemplate>,
    pub initial: SidedFormula,
    pub maintenance: SidedFormula,
}

impl StrategyDefinition {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn contract(strike: Decimal, day: u32) -> OptionContract {
        OptionContract::new(
            OptionRight::Call,
            strike,
            NaiveDate::from_ymd_opt(2023, 5, day).unwrap(),
        )
    }

    #[test]
    fn test_strike_rules() {
        let low = contract(dec!(300), 19);
        let mid = contract(dec!(310), 19);
        let legs = [&low, &mid];

        assert!(StrikeRule::Any.accepts(dec!(1), &legs));
        assert!(StrikeRule::SameAs(0).accepts(dec!(300), &legs));
        assert!(StrikeRule::Above(0).accepts(dec!(305), &legs));
        assert!(!StrikeRule::Below(0).accepts(dec!(305), &legs));
        let wing = StrikeRule::Equidistant { low: 0, middle: 1 };
        assert!(wing.accepts(dec!(320), &legs));
        assert!(!wing.accepts(dec!(330), &legs));
        // references to legs not matched yet never pass
        assert!(!StrikeRule::SameAs(5).accepts(dec!(300), &legs));
    }

    #[test]
    fn test_expiry_rules() {
        let far = contract(dec!(300), 19);
        let near = contract(dec!(300), 17);
        let legs = [&far];
        assert!(ExpiryRule::Before(0).accepts(&near, &legs));
        assert!(!ExpiryRule::After(0).accepts(&near, &legs));
        assert!(ExpiryRule::SameAs(0).accepts(&far, &legs));
    }

    #[test]
    fn test_side_from_quantity() {
        assert_eq!(StrategySide::of(dec!(3)), StrategySide::Template);
        assert_eq!(StrategySide::of(dec!(-3)), StrategySide::Inverted);
        assert_eq!(StrategySide::of(dec!(0)), StrategySide::Template);
        assert_eq!(StrategySide::Inverted.sign(), dec!(-1));
    }
}
