//! Position group buying power
//!
//! Margin of whole position groups, affordability of contemplated orders
//! and order sizing against a margin budget.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │            PositionGroupBuyingPowerModel (trait)              │
//! ├───────────────────────────────────────────────────────────────┤
//! │  required:  initial_margin, maintenance_margin                │
//! │  provided:  reserved_buying_power_impact                      │
//! │             has_sufficient_buying_power_for_order             │
//! │             maximum_lots_for_{delta,target}_buying_power ─────┼──► OrderQuantityResolver
//! └───────────────────────────────────────────────────────────────┘
//!          ▲                                   ▲
//!          │ Naked / Unmatched                 │ Strategy(id)
//!  SecurityPositionGroupBuyingPowerModel   OptionStrategyPositionGroupBuyingPowerModel
//!   sum of per-security margins             catalog formula x |quantity|
//! ```

mod generic;
mod option_strategy;
mod quantity;
mod traits;
mod types;

pub use generic::SecurityPositionGroupBuyingPowerModel;
pub use option_strategy::OptionStrategyPositionGroupBuyingPowerModel;
pub use quantity::{apply_lots, OrderQuantityResolver, DELTA_CANNOT_BE_APPLIED};
pub use traits::{BoxedPositionGroupBuyingPowerModel, PositionGroupBuyingPowerModel};
pub use types::{MaximumLotsResult, ReservedBuyingPowerImpact, SufficientBuyingPowerResult};

use crate::positions::{GroupKind, PositionGroup};

impl PositionGroup {
    /// Buying power model that margins this group
    pub fn buying_power_model(&self) -> BoxedPositionGroupBuyingPowerModel {
        match self.kind() {
            GroupKind::Strategy(id) => Box::new(OptionStrategyPositionGroupBuyingPowerModel::new(id)),
            GroupKind::Naked | GroupKind::Unmatched => {
                Box::new(SecurityPositionGroupBuyingPowerModel::new())
            }
        }
    }
}
