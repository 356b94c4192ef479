//! Properties of the position group resolver over the fixture chain

mod common;

use common::*;
use option_margin::config::{ResolverSettings, TieBreak};
use option_margin::{
    GroupKind, Portfolio, PositionCollection, PositionGroup, PositionGroupResolver, StrategyId, Symbol,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn scaled(strategy: StrategyId, quantity: Decimal) -> PositionCollection {
    strategy_legs(strategy)
        .into_iter()
        .map(|(symbol, unit)| (symbol, unit * quantity))
        .collect()
}

fn mixed_book() -> PositionCollection {
    [
        (spy(), dec!(1550)),
        (call(dec!(300)), dec!(-10)),
        (call(dec!(310)), dec!(7)),
        (call(dec!(320)), dec!(-3)),
        (put(dec!(300)), dec!(5)),
        (put(dec!(310)), dec!(-5)),
        (near_call(dec!(300)), dec!(-2)),
        (near_put(dec!(300)), dec!(4)),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Partition
// ============================================================================

#[test_log::test]
fn test_groups_partition_holdings() {
    let portfolio = spy_portfolio();
    let book = mixed_book();
    let groups = portfolio
        .resolver()
        .resolve(&book, portfolio.securities())
        .unwrap();

    let mut allocated = PositionCollection::new();
    for group in &groups {
        for position in group.positions() {
            allocated.add_position(position);
        }
    }
    assert_eq!(allocated, book);
}

#[test_log::test]
fn test_resolution_is_deterministic() {
    let portfolio = spy_portfolio();
    let book = mixed_book();
    let first = portfolio.resolver().resolve(&book, portfolio.securities()).unwrap();
    let second = portfolio.resolver().resolve(&book, portfolio.securities()).unwrap();
    assert_eq!(first, second);
}

#[test_log::test]
fn test_leftovers_are_naked() {
    let portfolio = spy_portfolio();
    let groups = portfolio
        .resolver()
        .resolve(&mixed_book(), portfolio.securities())
        .unwrap();
    for group in groups.iter().filter(|g| g.kind() == GroupKind::Naked) {
        assert_eq!(group.len(), 1);
    }
    assert!(groups.iter().any(|g| g.strategy().is_some()));
}

// ============================================================================
// Scaling
// ============================================================================

#[test_log::test]
fn test_margin_scales_linearly_with_lots() {
    let portfolio = spy_portfolio();
    for strategy in StrategyId::ALL {
        for side in [dec!(1), dec!(-1)] {
            let unit = portfolio.margin_for_positions(&scaled(strategy, side)).unwrap();
            for lots in [dec!(2), dec!(5), dec!(13)] {
                let margin = portfolio
                    .margin_for_positions(&scaled(strategy, side * lots))
                    .unwrap();
                assert_eq!(margin, unit * lots, "{} x {}", strategy, side * lots);
            }
        }
    }
}

#[test]
fn test_with_quantity_round_trip() {
    for strategy in StrategyId::ALL {
        let group = strategy_group(strategy, dec!(7));
        for quantity in [dec!(-3), dec!(0), dec!(1), dec!(250)] {
            assert_eq!(group.with_quantity(quantity).with_quantity(dec!(7)), group);
        }
    }
}

// ============================================================================
// Strategy selection
// ============================================================================

#[test_log::test]
fn test_every_strategy_is_recognized() {
    let portfolio = spy_portfolio();
    for strategy in StrategyId::ALL {
        let group = portfolio
            .resolver()
            .group_as(strategy, &scaled(strategy, dec!(4)), portfolio.securities())
            .unwrap();
        assert_eq!(group.strategy(), Some(strategy));
        assert_eq!(group.quantity(), dec!(4));
    }
}

#[test_log::test]
fn test_tie_break_does_not_change_margin() {
    let book: PositionCollection = [(call(dec!(300)), dec!(-10)), (call(dec!(310)), dec!(10))]
        .into_iter()
        .collect();

    let margin_with = |settings: ResolverSettings| -> (Vec<PositionGroup>, Decimal) {
        let portfolio: Portfolio =
            spy_portfolio().with_resolver(PositionGroupResolver::new(settings));
        let groups = portfolio.resolver().resolve(&book, portfolio.securities()).unwrap();
        let margin = portfolio.margin_for_positions(&book).unwrap();
        (groups, margin)
    };

    let (catalog_order, first) = margin_with(ResolverSettings {
        prefer_template_side: false,
        tie_break: TieBreak::CatalogOrder,
    });
    let (reverse_order, second) = margin_with(ResolverSettings {
        prefer_template_side: false,
        tie_break: TieBreak::ReverseCatalogOrder,
    });

    assert_eq!(catalog_order[0].strategy(), Some(StrategyId::BearCallSpread));
    assert_eq!(reverse_order[0].strategy(), Some(StrategyId::BullCallSpread));
    assert_eq!(reverse_order[0].quantity(), dec!(-10));
    assert_eq!(first, dec!(10000));
    assert_eq!(first, second);
}

#[test_log::test]
fn test_preferred_strategy_falls_back() {
    let portfolio = spy_portfolio();
    let book = scaled(StrategyId::CoveredCall, dec!(3));
    let groups = portfolio
        .resolver()
        .resolve_with_preference(&book, portfolio.securities(), Some(StrategyId::IronCondor))
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].strategy(), Some(StrategyId::CoveredCall));
}

#[test]
fn test_unknown_security_fails() {
    let portfolio = spy_portfolio();
    let book: PositionCollection = [(Symbol::equity("QQQ"), dec!(10))].into_iter().collect();
    assert!(portfolio.margin_for_positions(&book).is_err());
}
