use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

use super::position::Position;
use crate::common::errors::{MarginError, Result};
use crate::common::types::{signum, Symbol};
use crate::strategy::{StrategyId, StrategySide};

/// What a position group represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKind {
    /// A single security margined on its own
    Naked,
    /// Legs matched to a catalog strategy
    Strategy(StrategyId),
    /// Legs with no recognized strategy, e.g. a combo order
    Unmatched,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Naked => write!(f, "Naked"),
            GroupKind::Strategy(id) => write!(f, "{}", id),
            GroupKind::Unmatched => write!(f, "Unmatched"),
        }
    }
}

/// Greatest common divisor of two exact decimals
pub(crate) fn gcd(a: Decimal, b: Decimal) -> Decimal {
    let (mut a, mut b) = (a.abs(), b.abs());
    while !b.is_zero() {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

/// Positions margined together
///
/// Every position's quantity is its unit quantity times the group quantity.
/// The group quantity is signed: a negative quantity holds every leg with
/// the sign opposite to its unit quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionGroup {
    kind: GroupKind,
    quantity: Decimal,
    positions: Vec<Position>,
}

impl PositionGroup {
    /// Group without any position
    pub fn empty() -> Self {
        Self {
            kind: GroupKind::Unmatched,
            quantity: Decimal::ZERO,
            positions: Vec::new(),
        }
    }

    /// Single security group with unit quantity 1
    pub fn naked(symbol: Symbol, quantity: Decimal) -> Self {
        Self {
            kind: GroupKind::Naked,
            quantity,
            positions: vec![Position::new(symbol, quantity, Decimal::ONE)],
        }
    }

    /// Strategy group from per-unit leg ratios, in template order
    pub fn for_strategy(
        strategy: StrategyId,
        quantity: Decimal,
        legs: impl IntoIterator<Item = (Symbol, Decimal)>,
    ) -> Self {
        let positions = legs
            .into_iter()
            .map(|(symbol, unit)| Position::new(symbol, unit * quantity, unit))
            .collect();
        Self {
            kind: GroupKind::Strategy(strategy),
            quantity,
            positions,
        }
    }

    /// Group from flat quantities, reducing unit quantities to their lowest
    /// common ratio
    ///
    /// The group quantity takes the sign that makes the first leg's unit
    /// quantity positive.
    pub fn from_positions(
        kind: GroupKind,
        positions: impl IntoIterator<Item = (Symbol, Decimal)>,
    ) -> Result<Self> {
        let positions: Vec<(Symbol, Decimal)> = positions
            .into_iter()
            .filter(|(_, quantity)| !quantity.is_zero())
            .collect();

        let mut seen = BTreeSet::new();
        for (symbol, _) in &positions {
            if !seen.insert(symbol) {
                return Err(MarginError::invariant(format!(
                    "symbol {} appears twice in one group",
                    symbol
                )));
            }
        }

        let Some((_, first)) = positions.first() else {
            return Ok(Self::empty());
        };
        if kind == GroupKind::Naked && positions.len() != 1 {
            return Err(MarginError::invariant(format!(
                "naked group must hold exactly one security, got {}",
                positions.len()
            )));
        }

        let divisor = positions
            .iter()
            .fold(Decimal::ZERO, |acc, (_, quantity)| gcd(acc, *quantity));
        let quantity = divisor * signum(*first);

        let positions = positions
            .into_iter()
            .map(|(symbol, q)| Position::new(symbol, q, (q / quantity).normalize()))
            .collect();
        Ok(Self {
            kind,
            quantity: quantity.normalize(),
            positions,
        })
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn strategy(&self) -> Option<StrategyId> {
        match self.kind {
            GroupKind::Strategy(id) => Some(id),
            _ => None,
        }
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn side(&self) -> StrategySide {
        StrategySide::of(self.quantity)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol() == symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.positions.iter().map(|p| p.symbol())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Same legs and ratios holding `quantity` units
    ///
    /// A quantity with the opposite sign flips every leg.
    pub fn with_quantity(&self, quantity: Decimal) -> Self {
        Self {
            kind: self.kind,
            quantity,
            positions: self
                .positions
                .iter()
                .map(|p| p.for_group_quantity(quantity))
                .collect(),
        }
    }

    /// One unit on the side currently held (template side when flat)
    pub fn unit_group(&self) -> Self {
        self.with_quantity(self.side().sign())
    }

    /// Whether any leg trades one of `other`'s symbols
    pub fn overlaps(&self, other: &PositionGroup) -> bool {
        self.symbols().any(|symbol| other.position(symbol).is_some())
    }

    /// Factor `k` such that every leg of `self` is `k` times the same leg of
    /// `other`
    ///
    /// `None` when the symbols differ or the legs are not proportional.
    pub fn proportion_of(&self, other: &PositionGroup) -> Option<Decimal> {
        if self.len() != other.len() || self.is_empty() {
            return None;
        }
        let mut factor = None;
        for position in &self.positions {
            let base = other.position(position.symbol())?.quantity();
            if base.is_zero() {
                return None;
            }
            let ratio = position.quantity() / base;
            match factor {
                None => factor = Some(ratio),
                Some(k) if k == ratio => {}
                Some(_) => return None,
            }
        }
        factor
    }
}
