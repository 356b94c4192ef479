//! Common test utilities and fixtures
#![allow(dead_code)]

use chrono::NaiveDate;
use option_margin::orders::{combo_orders, Order};
use option_margin::securities::{OptionMarginModel, Security, SecurityManager, SecurityMarginModel};
use option_margin::{OptionRight, Portfolio, PositionGroup, StrategyId, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Starting cash; with no holdings this is the total portfolio value
pub const STARTING_CASH: Decimal = dec!(1000000);

pub fn may19() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, 19).unwrap()
}

pub fn may17() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, 17).unwrap()
}

pub fn spy() -> Symbol {
    Symbol::equity("SPY")
}

pub fn call(strike: Decimal) -> Symbol {
    Symbol::option("SPY", OptionRight::Call, strike, may19())
}

pub fn put(strike: Decimal) -> Symbol {
    Symbol::option("SPY", OptionRight::Put, strike, may19())
}

pub fn near_call(strike: Decimal) -> Symbol {
    Symbol::option("SPY", OptionRight::Call, strike, may17())
}

pub fn near_put(strike: Decimal) -> Symbol {
    Symbol::option("SPY", OptionRight::Put, strike, may17())
}

/// SPY at 410 with a deep in-the-money call chain and nearly worthless puts
pub fn spy_portfolio() -> Portfolio {
    let mut securities = SecurityManager::new();
    securities.add(Security::new(
        spy(),
        dec!(410),
        dec!(1),
        SecurityMarginModel::default().into_boxed(),
    ));

    let options = [
        (call(dec!(300)), dec!(112)),
        (call(dec!(310)), dec!(102)),
        (call(dec!(320)), dec!(92)),
        (call(dec!(330)), dec!(82)),
        (put(dec!(300)), dec!(0.02)),
        (put(dec!(310)), dec!(0.02)),
        (put(dec!(320)), dec!(0.03)),
        (near_call(dec!(300)), dec!(112)),
        (near_put(dec!(300)), dec!(0.01)),
    ];
    for (symbol, price) in options {
        securities.add(Security::new(
            symbol,
            price,
            dec!(100),
            OptionMarginModel::default().into_boxed(),
        ));
    }

    Portfolio::new(STARTING_CASH, securities)
}

/// Fill `quantity` more of `symbol` at its current price
///
/// Cash pays for the fill, so the total portfolio value is unchanged.
pub fn fill(portfolio: &mut Portfolio, symbol: &Symbol, quantity: Decimal) {
    let security = portfolio.securities().get(symbol).unwrap();
    let cost = security.convert(security.value_of(quantity));
    let holdings = security.holdings() + quantity;
    portfolio.set_cash(portfolio.cash() - cost);
    portfolio.set_holdings(symbol, holdings).unwrap();
}

/// Fill every leg of a strategy group
pub fn fill_group(portfolio: &mut Portfolio, group: &PositionGroup) {
    for position in group.positions() {
        fill(portfolio, position.symbol(), position.quantity());
    }
}

/// Per-unit legs of each strategy over the fixture chain, in template order
pub fn strategy_legs(strategy: StrategyId) -> Vec<(Symbol, Decimal)> {
    match strategy {
        StrategyId::CoveredCall => vec![(call(dec!(300)), dec!(-1)), (spy(), dec!(100))],
        StrategyId::CoveredPut => vec![(put(dec!(300)), dec!(-1)), (spy(), dec!(-100))],
        StrategyId::BearCallSpread => vec![(call(dec!(300)), dec!(-1)), (call(dec!(310)), dec!(1))],
        StrategyId::BearPutSpread => vec![(put(dec!(310)), dec!(1)), (put(dec!(300)), dec!(-1))],
        StrategyId::BullCallSpread => vec![(call(dec!(300)), dec!(1)), (call(dec!(310)), dec!(-1))],
        StrategyId::BullPutSpread => vec![(put(dec!(300)), dec!(1)), (put(dec!(310)), dec!(-1))],
        StrategyId::Straddle => vec![(call(dec!(300)), dec!(1)), (put(dec!(300)), dec!(1))],
        StrategyId::Strangle => vec![(call(dec!(310)), dec!(1)), (put(dec!(300)), dec!(1))],
        StrategyId::ButterflyCall => vec![
            (call(dec!(300)), dec!(1)),
            (call(dec!(310)), dec!(-2)),
            (call(dec!(320)), dec!(1)),
        ],
        StrategyId::ShortButterflyCall => vec![
            (call(dec!(300)), dec!(-1)),
            (call(dec!(310)), dec!(2)),
            (call(dec!(320)), dec!(-1)),
        ],
        StrategyId::ButterflyPut => vec![
            (put(dec!(300)), dec!(1)),
            (put(dec!(310)), dec!(-2)),
            (put(dec!(320)), dec!(1)),
        ],
        StrategyId::ShortButterflyPut => vec![
            (put(dec!(300)), dec!(-1)),
            (put(dec!(310)), dec!(2)),
            (put(dec!(320)), dec!(-1)),
        ],
        StrategyId::CallCalendarSpread => {
            vec![(call(dec!(300)), dec!(1)), (near_call(dec!(300)), dec!(-1))]
        }
        StrategyId::PutCalendarSpread => {
            vec![(put(dec!(300)), dec!(1)), (near_put(dec!(300)), dec!(-1))]
        }
        StrategyId::IronCondor => vec![
            (put(dec!(300)), dec!(1)),
            (put(dec!(310)), dec!(-1)),
            (call(dec!(320)), dec!(-1)),
            (call(dec!(330)), dec!(1)),
        ],
    }
}

pub fn strategy_group(strategy: StrategyId, quantity: Decimal) -> PositionGroup {
    PositionGroup::for_strategy(strategy, quantity, strategy_legs(strategy))
}

/// Combo orders trading `quantity` units of a strategy
pub fn strategy_orders(strategy: StrategyId, quantity: Decimal) -> Vec<Order> {
    combo_orders(1, 1, quantity, &strategy_legs(strategy))
}

/// Maintenance margin of one strategy unit held +1 and -1 over the fixture chain
pub fn unit_maintenance_margins() -> Vec<(StrategyId, Decimal, Decimal)> {
    vec![
        (StrategyId::CoveredCall, dec!(20500), dec!(16600)),
        (StrategyId::CoveredPut, dec!(20500), dec!(20500)),
        (StrategyId::BearCallSpread, dec!(1000), dec!(0)),
        (StrategyId::BearPutSpread, dec!(0), dec!(1000)),
        (StrategyId::BullCallSpread, dec!(0), dec!(1000)),
        (StrategyId::BullPutSpread, dec!(1000), dec!(0)),
        (StrategyId::Straddle, dec!(11202), dec!(23502)),
        (StrategyId::Strangle, dec!(10202), dec!(22502)),
        (StrategyId::ButterflyCall, dec!(0), dec!(1000)),
        (StrategyId::ShortButterflyCall, dec!(1000), dec!(0)),
        (StrategyId::ButterflyPut, dec!(0), dec!(1000)),
        (StrategyId::ShortButterflyPut, dec!(1000), dec!(0)),
        (StrategyId::CallCalendarSpread, dec!(0), dec!(0)),
        (StrategyId::PutCalendarSpread, dec!(0), dec!(0)),
        (StrategyId::IronCondor, dec!(1000), dec!(0)),
    ]
}
