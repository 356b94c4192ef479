//! Option strategy catalog
//!
//! Declarative descriptions of the multi-leg option strategies the engine
//! recognizes, and the margin formulas that replace per-leg margin once a
//! group of positions has been matched to one of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  StrategyCatalog (static)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StrategyDefinition                                         │
//! │    - legs: right, signed ratio, strike rule, expiry rule    │
//! │    - initial / maintenance: SidedFormula                    │
//! │        template side  (group quantity > 0)                  │
//! │        inverted side  (group quantity < 0)                  │
//! └─────────────────────────────────────────────────────────────┘
//!              │ matched by                    │ evaluated by
//!              ▼                               ▼
//!   PositionGroupResolver          OptionStrategyPositionGroupBuyingPowerModel
//!                                    per-unit formula x |group quantity|
//! ```
//!
//! # Components
//!
//! - [`StrategyId`]: Tag of every supported strategy
//! - [`StrategyDefinition`]: Leg templates plus margin formulas
//! - [`StrategyCatalog`]: Ordered registry; [`OPTION_STRATEGY_CATALOG`] is the global instance
//! - [`StrategyLegs`]: Unit legs bound to their securities, the input of every formula
//!
//! Adding a strategy means adding a [`StrategyId`] variant and its
//! definition; no matching or margin code changes.

mod catalog;
pub mod formulas;
mod types;

pub use catalog::{StrategyCatalog, OPTION_STRATEGY_CATALOG};

pub use formulas::{StrategyLeg, StrategyLegs};

pub use types::{
    ExpiryRule,
    LegTemplate,
    MarginFormulaFn,
    SidedFormula,
    StrategyDefinition,
    StrategyId,
    StrategySide,
    StrikeRule,
};
