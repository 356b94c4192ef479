//! Order requests and combo order grouping

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{MarginError, Result};
use crate::common::types::Symbol;
use crate::positions::{GroupKind, PositionGroup};

/// Shared state of the legs of one combo order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOrderManager {
    pub id: u64,
    /// Number of leg orders in the combo
    pub count: usize,
    /// Signed number of combo units
    pub quantity: Decimal,
}

impl GroupOrderManager {
    pub fn new(id: u64, count: usize, quantity: Decimal) -> Self {
        Self {
            id,
            count,
            quantity,
        }
    }
}

/// Order request for a single security
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub symbol: Symbol,
    /// Signed quantity to trade
    pub quantity: Decimal,
    #[serde(default)]
    pub group_order_manager: Option<GroupOrderManager>,
}

impl Order {
    /// Stand-alone order
    pub fn new(id: u64, symbol: Symbol, quantity: Decimal) -> Self {
        Self {
            id,
            symbol,
            quantity,
            group_order_manager: None,
        }
    }

    /// Leg of a combo order; the quantity is the leg ratio times the combo quantity
    pub fn combo_leg(id: u64, symbol: Symbol, leg_ratio: Decimal, manager: GroupOrderManager) -> Self {
        Self {
            id,
            symbol,
            quantity: leg_ratio * manager.quantity,
            group_order_manager: Some(manager),
        }
    }

    pub fn is_combo(&self) -> bool {
        self.group_order_manager.is_some()
    }
}

/// Build the legs of a combo order, numbering them from `first_id`
pub fn combo_orders(
    first_id: u64,
    manager_id: u64,
    quantity: Decimal,
    legs: &[(Symbol, Decimal)],
) -> Vec<Order> {
    let manager = GroupOrderManager::new(manager_id, legs.len(), quantity);
    legs.iter()
        .zip(first_id..)
        .map(|((symbol, ratio), id)| Order::combo_leg(id, symbol.clone(), *ratio, manager))
        .collect()
}

/// Contemplated position group described by a set of orders
///
/// A single stand-alone order becomes a naked group; combo legs must all
/// belong to the same, complete combo.
pub fn group_from_orders(orders: &[Order]) -> Result<PositionGroup> {
    let Some(first) = orders.first() else {
        return Err(MarginError::invariant("no orders to group"));
    };
    if let Some(order) = orders.iter().find(|o| o.quantity.is_zero()) {
        return Err(MarginError::InvalidQuantity(format!(
            "order {} trades no quantity of {}",
            order.id, order.symbol
        )));
    }

    match first.group_order_manager {
        None => {
            if orders.len() != 1 {
                return Err(MarginError::invariant(
                    "stand-alone orders cannot be grouped together",
                ));
            }
            Ok(PositionGroup::naked(first.symbol.clone(), first.quantity))
        }
        Some(manager) => {
            let same_combo = orders
                .iter()
                .all(|o| o.group_order_manager.map(|m| m.id) == Some(manager.id));
            if !same_combo {
                return Err(MarginError::invariant(format!(
                    "orders do not all belong to combo {}",
                    manager.id
                )));
            }
            if orders.len() != manager.count {
                return Err(MarginError::invariant(format!(
                    "combo {} expects {} legs, got {}",
                    manager.id,
                    manager.count,
                    orders.len()
                )));
            }
            PositionGroup::from_positions(
                GroupKind::Unmatched,
                orders.iter().map(|o| (o.symbol.clone(), o.quantity)),
            )
        }
    }
}
