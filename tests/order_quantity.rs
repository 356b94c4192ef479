//! Order sizing against delta and target margin budgets
//!
//! Lots are counted along the side each group is held on.

mod common;

use common::*;
use option_margin::buying_power::{apply_lots, PositionGroupBuyingPowerModel, DELTA_CANNOT_BE_APPLIED};
use option_margin::{MaximumLotsResult, Portfolio, PositionGroup, StrategyId};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn for_delta(portfolio: &Portfolio, group: &PositionGroup, delta: Decimal) -> MaximumLotsResult {
    group
        .buying_power_model()
        .maximum_lots_for_delta_buying_power(portfolio, group, delta, dec!(0))
        .unwrap()
}

fn for_target(portfolio: &Portfolio, group: &PositionGroup, target: Decimal) -> MaximumLotsResult {
    group
        .buying_power_model()
        .maximum_lots_for_target_buying_power(portfolio, group, target, dec!(0))
        .unwrap()
}

fn maintenance(portfolio: &Portfolio, group: &PositionGroup) -> Decimal {
    group
        .buying_power_model()
        .maintenance_margin(portfolio, group)
        .unwrap()
}

// ============================================================================
// Delta budgets
// ============================================================================

#[test_log::test]
fn test_delta_adds_one_covered_call() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    let result = for_delta(&portfolio, &group, dec!(20500) * dec!(1.001));
    assert_eq!(result, MaximumLotsResult::lots(dec!(1)));
}

#[test_log::test]
fn test_delta_removes_one_covered_call() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    let result = for_delta(&portfolio, &group, dec!(-20500) * dec!(0.999));
    assert_eq!(result.number_of_lots, dec!(-1));
}

#[test_log::test]
fn test_delta_on_inverted_covered_call() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(-10));

    let grow = for_delta(&portfolio, &group, dec!(16600) * dec!(1.001));
    assert_eq!(grow.number_of_lots, dec!(1));
    assert_eq!(apply_lots(&group, grow.number_of_lots).quantity(), dec!(-11));

    // freeing slightly more than one unit needs two units closed
    let shrink = for_delta(&portfolio, &group, dec!(-16600) * dec!(1.001));
    assert_eq!(shrink.number_of_lots, dec!(-2));
    assert_eq!(apply_lots(&group, shrink.number_of_lots).quantity(), dec!(-8));
}

#[test_log::test]
fn test_delta_never_overshoots() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::Straddle, dec!(3));
    let delta = dec!(100000);
    let result = for_delta(&portfolio, &group, delta);
    let resized = apply_lots(&group, result.number_of_lots);
    let next = apply_lots(&group, result.number_of_lots + dec!(1));

    let current = maintenance(&portfolio, &group);
    assert!(maintenance(&portfolio, &resized) - current <= delta);
    assert!(maintenance(&portfolio, &next) - current > delta);
    assert_eq!(result.number_of_lots, dec!(8));
}

#[test_log::test]
fn test_zero_margin_strategy_cannot_be_sized() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CallCalendarSpread, dec!(5));
    let result = for_delta(&portfolio, &group, dec!(10000));
    assert_eq!(result.number_of_lots, dec!(0));
    assert!(!result.is_error);
    assert_eq!(result.reason, DELTA_CANNOT_BE_APPLIED);
}

#[test]
fn test_minimum_order_margin_skips_small_orders() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    let result = group
        .buying_power_model()
        .maximum_lots_for_delta_buying_power(&portfolio, &group, dec!(30750), dec!(0.05))
        .unwrap();
    assert_eq!(result.number_of_lots, dec!(0));
    assert!(!result.is_error);
    assert!(result.reason.contains("minimum order margin"));
}

// ============================================================================
// Target budgets
// ============================================================================

#[test_log::test]
fn test_target_from_flat() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(0));
    // 500000 / 20500 = 24.39
    assert_eq!(for_target(&portfolio, &group, dec!(0.5)).number_of_lots, dec!(24));
}

#[test_log::test]
fn test_zero_target_liquidates() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    assert_eq!(for_target(&portfolio, &group, dec!(0)).number_of_lots, dec!(-10));
}

#[test_log::test]
fn test_negative_target_flips_to_other_side() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    // 500000 / 16600 = 30.12 units on the inverted side
    let result = for_target(&portfolio, &group, dec!(-0.5));
    assert_eq!(result.number_of_lots, dec!(-40));
    assert_eq!(apply_lots(&group, result.number_of_lots).quantity(), dec!(-30));
}

#[test_log::test]
fn test_flip_prices_the_other_side() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::Straddle, dec!(10));
    // short straddles cost 23502 per unit: 200000 / 23502 = 8.51
    let result = for_target(&portfolio, &group, dec!(-0.2));
    assert_eq!(result.number_of_lots, dec!(-18));
    assert_eq!(apply_lots(&group, result.number_of_lots).quantity(), dec!(-8));
}

#[test_log::test]
fn test_target_and_delta_agree() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    let current = maintenance(&portfolio, &group);
    let tpv = portfolio.total_portfolio_value();

    for target in [dec!(0), dec!(0.1), dec!(0.205), dec!(0.3), dec!(0.9)] {
        let by_target = for_target(&portfolio, &group, target);
        let by_delta = for_delta(&portfolio, &group, target * tpv - current);
        assert_eq!(by_target, by_delta, "target {}", target);
    }
}

#[test_log::test]
fn test_target_equal_to_current_margin() {
    let portfolio = spy_portfolio();
    let group = strategy_group(StrategyId::CoveredCall, dec!(10));
    let result = for_target(&portfolio, &group, dec!(0.205));
    assert_eq!(result.number_of_lots, dec!(0));
    assert!(!result.is_error);
}
