use once_cell::sync::Lazy;

use super::formulas::{
    butterfly, covered_hypothetical_maintenance, covered_initial, covered_maintenance,
    iron_condor, premium_sum, short_pair, underlying_maintenance,
    vertical_initial, vertical_maintenance, zero,
};
use super::types::{
    ExpiryRule, LegTemplate, SidedFormula, StrategyDefinition, StrategyId, StrikeRule,
};
use crate::common::types::OptionRight::{Call, Put};

/// Global strategy catalog, built on first use
pub static OPTION_STRATEGY_CATALOG: Lazy<StrategyCatalog> = Lazy::new(StrategyCatalog::standard);

/// Immutable, ordered registry of strategy definitions
///
/// Declaration order is the final tie-break when two strategies explain the
/// same positions equally well.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    definitions: Vec<StrategyDefinition>,
}

impl StrategyCatalog {
    pub fn new(definitions: Vec<StrategyDefinition>) -> Self {
        Self { definitions }
    }

    /// Catalog of every supported option strategy
    pub fn standard() -> Self {
        Self::new(StrategyId::ALL.iter().map(|id| definition(*id)).collect())
    }

    pub fn get(&self, id: StrategyId) -> Option<&StrategyDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Declaration index of a strategy
    pub fn position(&self, id: StrategyId) -> Option<usize> {
        self.definitions.iter().position(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &StrategyDefinition)> {
        self.definitions.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn vertical(id: StrategyId, first: LegTemplate, second: LegTemplate) -> StrategyDefinition {
    StrategyDefinition {
        id,
        legs: vec![first, second],
        initial: SidedFormula::symmetric(vertical_initial),
        maintenance: SidedFormula::symmetric(vertical_maintenance),
    }
}

fn butterfly_legs(right: crate::common::types::OptionRight, wing: i64) -> Vec<LegTemplate> {
    vec![
        LegTemplate::option(right, wing, StrikeRule::Any, ExpiryRule::Any),
        LegTemplate::option(right, -2 * wing, StrikeRule::Above(0), ExpiryRule::SameAs(0)),
        LegTemplate::option(
            right,
            wing,
            StrikeRule::Equidistant { low: 0, middle: 1 },
            ExpiryRule::SameAs(0),
        ),
    ]
}

fn definition(id: StrategyId) -> StrategyDefinition {
    use ExpiryRule as E;
    use LegTemplate as L;
    use StrikeRule as S;

    match id {
        StrategyId::CoveredCall => StrategyDefinition {
            id,
            legs: vec![
                L::option(Call, -1, S::Any, E::Any),
                L::Underlying { direction: 1 },
            ],
            initial: SidedFormula::new(covered_initial, zero),
            maintenance: SidedFormula::new(covered_maintenance, covered_hypothetical_maintenance),
        },
        StrategyId::CoveredPut => StrategyDefinition {
            id,
            legs: vec![
                L::option(Put, -1, S::Any, E::Any),
                L::Underlying { direction: -1 },
            ],
            initial: SidedFormula::new(covered_initial, zero),
            maintenance: SidedFormula::new(covered_maintenance, underlying_maintenance),
        },
        StrategyId::BearCallSpread => vertical(
            id,
            L::option(Call, -1, S::Any, E::Any),
            L::option(Call, 1, S::Above(0), E::SameAs(0)),
        ),
        StrategyId::BearPutSpread => vertical(
            id,
            L::option(Put, 1, S::Any, E::Any),
            L::option(Put, -1, S::Below(0), E::SameAs(0)),
        ),
        StrategyId::BullCallSpread => vertical(
            id,
            L::option(Call, 1, S::Any, E::Any),
            L::option(Call, -1, S::Above(0), E::SameAs(0)),
        ),
        StrategyId::BullPutSpread => vertical(
            id,
            L::option(Put, 1, S::Any, E::Any),
            L::option(Put, -1, S::Above(0), E::SameAs(0)),
        ),
        StrategyId::Straddle | StrategyId::Strangle => {
            let put_strike = if id == StrategyId::Straddle {
                S::SameAs(0)
            } else {
                S::Below(0)
            };
            StrategyDefinition {
                id,
                legs: vec![
                    L::option(Call, 1, S::Any, E::Any),
                    L::option(Put, 1, put_strike, E::SameAs(0)),
                ],
                initial: SidedFormula::new(premium_sum, short_pair),
                maintenance: SidedFormula::new(premium_sum, short_pair),
            }
        }
        StrategyId::ButterflyCall
        | StrategyId::ShortButterflyCall
        | StrategyId::ButterflyPut
        | StrategyId::ShortButterflyPut => {
            let right = match id {
                StrategyId::ButterflyCall | StrategyId::ShortButterflyCall => Call,
                _ => Put,
            };
            let wing = match id {
                StrategyId::ButterflyCall | StrategyId::ButterflyPut => 1,
                _ => -1,
            };
            StrategyDefinition {
                id,
                legs: butterfly_legs(right, wing),
                initial: SidedFormula::symmetric(butterfly),
                maintenance: SidedFormula::symmetric(butterfly),
            }
        }
        StrategyId::CallCalendarSpread | StrategyId::PutCalendarSpread => {
            let right = if id == StrategyId::CallCalendarSpread {
                Call
            } else {
                Put
            };
            StrategyDefinition {
                id,
                legs: vec![
                    L::option(right, 1, S::Any, E::Any),
                    L::option(right, -1, S::SameAs(0), E::Before(0)),
                ],
                initial: SidedFormula::symmetric(zero),
                maintenance: SidedFormula::symmetric(zero),
            }
        }
        StrategyId::IronCondor => StrategyDefinition {
            id,
            legs: vec![
                L::option(Put, 1, S::Any, E::Any),
                L::option(Put, -1, S::Above(0), E::SameAs(0)),
                L::option(Call, -1, S::Above(1), E::SameAs(0)),
                L::option(Call, 1, S::Above(2), E::SameAs(0)),
            ],
            initial: SidedFormula::symmetric(iron_condor),
            maintenance: SidedFormula::symmetric(iron_condor),
        },
    }
}
