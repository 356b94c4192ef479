//! Positions, position groups and the strategy resolver

mod group;
mod position;
mod resolver;

pub use group::{GroupKind, PositionGroup};
pub use position::{Position, PositionCollection};
pub use resolver::PositionGroupResolver;
