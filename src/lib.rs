//! OptionMargin Library
//!
//! Position-group margin engine for equity and option portfolios: groups
//! holdings into recognized option strategies, computes initial and
//! maintenance margin per group, checks whether orders are affordable and
//! sizes orders against a margin budget.

pub mod buying_power;
pub mod common;
pub mod config;
pub mod orders;
pub mod portfolio;
pub mod positions;
pub mod securities;
pub mod snapshot;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{MarginError, Result};
pub use common::types::{OptionContract, OptionRight, Symbol};
pub use config::types::EngineConfig;
pub use portfolio::Portfolio;
pub use snapshot::{PortfolioSnapshot, SecuritySnapshot};

// Margin types
pub use buying_power::{
    BoxedPositionGroupBuyingPowerModel, MaximumLotsResult, OptionStrategyPositionGroupBuyingPowerModel,
    PositionGroupBuyingPowerModel, ReservedBuyingPowerImpact, SecurityPositionGroupBuyingPowerModel,
    SufficientBuyingPowerResult,
};
pub use orders::{combo_orders, group_from_orders, GroupOrderManager, Order};
pub use positions::{GroupKind, Position, PositionCollection, PositionGroup, PositionGroupResolver};
pub use securities::{Security, SecurityManager};
pub use strategy::{StrategyId, StrategySide, OPTION_STRATEGY_CATALOG};
