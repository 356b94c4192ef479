use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::errors::{MarginError, Result};
use crate::common::types::Symbol;
use crate::securities::SecurityManager;

/// Holding of a single security inside a position group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    symbol: Symbol,
    /// Signed quantity held
    quantity: Decimal,
    /// Signed quantity per unit of the owning group
    unit_quantity: Decimal,
}

impl Position {
    pub fn new(symbol: Symbol, quantity: Decimal, unit_quantity: Decimal) -> Self {
        Self {
            symbol,
            quantity,
            unit_quantity,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_quantity(&self) -> Decimal {
        self.unit_quantity
    }

    /// Same leg sized for a group holding `group_quantity` units
    pub fn for_group_quantity(&self, group_quantity: Decimal) -> Self {
        Self {
            symbol: self.symbol.clone(),
            quantity: self.unit_quantity * group_quantity,
            unit_quantity: self.unit_quantity,
        }
    }

    /// Add the quantity of another position in the same symbol
    pub fn combine(&self, other: &Position) -> Result<Self> {
        if self.symbol != other.symbol {
            return Err(MarginError::invariant(format!(
                "cannot combine positions in {} and {}",
                self.symbol, other.symbol
            )));
        }
        Ok(Self {
            symbol: self.symbol.clone(),
            quantity: self.quantity + other.quantity,
            unit_quantity: self.unit_quantity,
        })
    }
}

/// Flat, symbol-keyed quantities
///
/// Zero quantities are never stored, so iteration only yields real
/// holdings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionCollection {
    quantities: BTreeMap<Symbol, Decimal>,
}

impl PositionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holdings of every security in the snapshot
    pub fn from_holdings(securities: &SecurityManager) -> Self {
        let mut collection = Self::new();
        for security in securities.iter() {
            collection.add(security.symbol().clone(), security.holdings());
        }
        collection
    }

    /// Add `quantity` to the holding in `symbol`
    pub fn add(&mut self, symbol: Symbol, quantity: Decimal) {
        let total = self.get(&symbol) + quantity;
        if total.is_zero() {
            self.quantities.remove(&symbol);
        } else {
            self.quantities.insert(symbol, total);
        }
    }

    pub fn add_position(&mut self, position: &Position) {
        self.add(position.symbol().clone(), position.quantity());
    }

    /// Sum of this collection and the given positions
    pub fn combined_with<'a>(&self, positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let mut combined = self.clone();
        for position in positions {
            combined.add_position(position);
        }
        combined
    }

    pub fn get(&self, symbol: &Symbol) -> Decimal {
        self.quantities.get(symbol).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, Decimal)> {
        self.quantities.iter().map(|(symbol, quantity)| (symbol, *quantity))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.quantities.keys()
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

impl FromIterator<(Symbol, Decimal)> for PositionCollection {
    fn from_iter<I: IntoIterator<Item = (Symbol, Decimal)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (symbol, quantity) in iter {
            collection.add(symbol, quantity);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_combine_same_symbol() {
        let a = Position::new(Symbol::equity("SPY"), dec!(100), dec!(1));
        let b = Position::new(Symbol::equity("SPY"), dec!(-30), dec!(1));
        assert_eq!(a.combine(&b).unwrap().quantity(), dec!(70));
    }

    #[test]
    fn test_combine_different_symbols_fails() {
        let a = Position::new(Symbol::equity("SPY"), dec!(100), dec!(1));
        let b = Position::new(Symbol::equity("QQQ"), dec!(100), dec!(1));
        assert!(matches!(a.combine(&b), Err(MarginError::InvariantViolation(_))));
    }

    #[test]
    fn test_collection_drops_flat_holdings() {
        let mut collection = PositionCollection::new();
        collection.add(Symbol::equity("SPY"), dec!(10));
        collection.add(Symbol::equity("SPY"), dec!(-10));
        collection.add(Symbol::equity("QQQ"), dec!(0));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_combined_with_nets_quantities() {
        let collection: PositionCollection = [
            (Symbol::equity("SPY"), dec!(100)),
            (Symbol::equity("QQQ"), dec!(5)),
        ]
        .into_iter()
        .collect();

        let order = [Position::new(Symbol::equity("SPY"), dec!(-100), dec!(1))];
        let combined = collection.combined_with(order.iter());
        assert_eq!(combined.len(), 1);
        assert_eq!(combined.get(&Symbol::equity("QQQ")), dec!(5));
    }
}
