//! Per-unit margin formulas referenced by the strategy catalog
//!
//! Every formula receives the legs of a unit group (group quantity of +1 or
//! -1), so leg quantities already carry the side the strategy is held on.
//! Results are in account currency.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::{MarginError, Result};
use crate::common::types::{OptionContract, OptionRight};
use crate::positions::PositionGroup;
use crate::securities::{OptionMarginModel, Security, SecurityManager, NAKED_MINIMUM_RATE};

/// One leg of a strategy unit
#[derive(Debug, Clone, Copy)]
pub struct StrategyLeg<'a> {
    pub security: &'a Security,
    /// Signed quantity held per strategy unit
    pub quantity: Decimal,
}

impl<'a> StrategyLeg<'a> {
    pub fn contract(&self) -> Option<&'a OptionContract> {
        self.security.symbol().contract()
    }

    pub fn strike(&self) -> Decimal {
        self.contract().map(|c| c.strike).unwrap_or_default()
    }

    pub fn is_short(&self) -> bool {
        self.quantity.is_sign_negative()
    }

    /// Unsigned market value in account currency
    pub fn value(&self) -> Decimal {
        self.security
            .convert(self.security.absolute_value_of(self.quantity))
    }

    /// In-the-money amount of an option leg in account currency
    pub fn intrinsic_value(&self, underlying_price: Decimal) -> Decimal {
        match self.contract() {
            Some(contract) => self.security.convert(
                contract.intrinsic_value(underlying_price)
                    * self.security.contract_multiplier()
                    * self.quantity.abs(),
            ),
            None => Decimal::ZERO,
        }
    }

    /// Strike distance to another leg times this leg's size, in account currency
    pub fn width_to(&self, other: &StrategyLeg<'_>) -> Decimal {
        self.security.convert(
            (self.strike() - other.strike()).abs()
                * self.security.contract_multiplier()
                * self.quantity.abs(),
        )
    }
}

/// Legs of a strategy unit together with the snapshot they were priced from
#[derive(Debug)]
pub struct StrategyLegs<'a> {
    pub securities: &'a SecurityManager,
    pub legs: Vec<StrategyLeg<'a>>,
}

impl<'a> StrategyLegs<'a> {
    /// Bind every position of `group` to its security
    pub fn from_group(securities: &'a SecurityManager, group: &PositionGroup) -> Result<Self> {
        let legs = group
            .positions()
            .iter()
            .map(|position| {
                Ok(StrategyLeg {
                    security: securities.get(position.symbol())?,
                    quantity: position.quantity(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { securities, legs })
    }

    pub fn options(&self) -> impl Iterator<Item = &StrategyLeg<'a>> {
        self.legs.iter().filter(|leg| leg.contract().is_some())
    }

    /// Option legs ordered by strike
    pub fn options_by_strike(&self) -> Vec<StrategyLeg<'a>> {
        let mut legs: Vec<_> = self.options().copied().collect();
        legs.sort_by(|a, b| a.strike().cmp(&b.strike()));
        legs
    }

    pub fn underlying(&self) -> Result<StrategyLeg<'a>> {
        self.legs
            .iter()
            .find(|leg| leg.contract().is_none())
            .copied()
            .ok_or_else(|| MarginError::invariant("strategy has no underlying leg"))
    }

    pub fn single_option(&self) -> Result<StrategyLeg<'a>> {
        let mut options = self.options();
        match (options.next(), options.next()) {
            (Some(leg), None) => Ok(*leg),
            _ => Err(MarginError::invariant("expected exactly one option leg")),
        }
    }

    pub fn short_leg(&self) -> Result<StrategyLeg<'a>> {
        self.options()
            .find(|leg| leg.is_short())
            .copied()
            .ok_or_else(|| MarginError::invariant("strategy has no short option leg"))
    }

    pub fn long_leg(&self) -> Result<StrategyLeg<'a>> {
        self.options()
            .find(|leg| !leg.is_short())
            .copied()
            .ok_or_else(|| MarginError::invariant("strategy has no long option leg"))
    }

    /// Price of the underlying equity
    pub fn underlying_price(&self) -> Result<Decimal> {
        let option = self
            .options()
            .next()
            .ok_or_else(|| MarginError::invariant("strategy has no option leg"))?;
        let underlying = self
            .securities
            .get(&option.security.symbol().underlying_symbol())?;
        Ok(underlying.price())
    }
}

pub fn zero(_legs: &StrategyLegs<'_>) -> Result<Decimal> {
    Ok(Decimal::ZERO)
}

// ----------------------------------------------------------------------------
// Covered positions
// ----------------------------------------------------------------------------

/// Short option premium, floored at its in-the-money amount
pub fn covered_initial(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let option = legs.single_option()?;
    let underlying = legs.underlying()?;
    Ok(option
        .value()
        .max(option.intrinsic_value(underlying.security.price())))
}

/// In-the-money amount plus the underlying margin at `min(option mark, strike)`
pub fn covered_hypothetical_maintenance(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let option = legs.single_option()?;
    let underlying = legs.underlying()?;
    let in_the_money = option.intrinsic_value(underlying.security.price());
    let hypothetical_price = option.security.price().min(option.strike());
    let hypothetical = underlying
        .security
        .with_price(hypothetical_price)
        .maintenance_margin(legs.securities, underlying.quantity)?;
    Ok(in_the_money + hypothetical)
}

/// Stock held against a short option: the hypothetical margin, or the stock
/// value capped requirement when that is larger
pub fn covered_maintenance(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let option = legs.single_option()?;
    let underlying = legs.underlying()?;
    let stock_margin = underlying
        .security
        .maintenance_margin(legs.securities, underlying.quantity)?;
    let capped = underlying.value().min(option.value().max(stock_margin));
    Ok(covered_hypothetical_maintenance(legs)?.max(capped))
}

/// Maintenance margin of the underlying leg alone
pub fn underlying_maintenance(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let underlying = legs.underlying()?;
    underlying
        .security
        .maintenance_margin(legs.securities, underlying.quantity)
}

// ----------------------------------------------------------------------------
// Vertical spreads
// ----------------------------------------------------------------------------

/// A vertical is a credit spread when the short leg is the one further in
/// the money
fn is_credit_spread(short: &StrategyLeg<'_>, long: &StrategyLeg<'_>) -> bool {
    match short.contract().map(|c| c.right) {
        Some(OptionRight::Call) => short.strike() < long.strike(),
        Some(OptionRight::Put) => short.strike() > long.strike(),
        None => false,
    }
}

/// Credit side: strike width; debit side: nothing beyond the premium paid
pub fn vertical_maintenance(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let short = legs.short_leg()?;
    let long = legs.long_leg()?;
    if !is_credit_spread(&short, &long) {
        return Ok(Decimal::ZERO);
    }
    Ok(short.width_to(&long))
}

/// Credit side: strike width less the net credit received
pub fn vertical_initial(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let short = legs.short_leg()?;
    let long = legs.long_leg()?;
    if !is_credit_spread(&short, &long) {
        return Ok(Decimal::ZERO);
    }
    let credit = short.value() - long.value();
    Ok((short.width_to(&long) - credit).max(Decimal::ZERO))
}

// ----------------------------------------------------------------------------
// Straddles and strangles
// ----------------------------------------------------------------------------

pub fn premium_sum(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    Ok(legs.options().map(|leg| leg.value()).sum())
}

/// Share of the underlying value charged on the naked leg of a short
/// straddle or strangle
pub const SHORT_PAIR_UNDERLYING_RATE: Decimal = dec!(0.30);

/// Naked requirement of one leg of a short pair, in account currency
///
/// Short legs carry their premium plus `max(30% of underlying - OTM,
/// 10% of underlying (calls) or strike (puts))`; long legs their premium.
fn short_pair_leg(leg: &StrategyLeg<'_>, underlying_price: Decimal) -> Result<Decimal> {
    let contract = leg
        .contract()
        .ok_or_else(|| MarginError::invariant("short pair leg is not an option"))?;
    if !leg.is_short() {
        return Ok(leg.value());
    }
    let per_share = OptionMarginModel::new(SHORT_PAIR_UNDERLYING_RATE, NAKED_MINIMUM_RATE)
        .naked_short_requirement(contract, leg.security.price(), underlying_price);
    Ok(leg
        .security
        .convert(per_share * leg.security.contract_multiplier() * leg.quantity.abs()))
}

/// Larger naked requirement of the two short legs plus the other leg's premium
pub fn short_pair(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let options: Vec<_> = legs.options().copied().collect();
    let [first, second] = options.as_slice() else {
        return Err(MarginError::invariant("expected two option legs"));
    };
    let underlying_price = legs.underlying_price()?;
    let first_requirement = short_pair_leg(first, underlying_price)?;
    let second_requirement = short_pair_leg(second, underlying_price)?;
    if first_requirement >= second_requirement {
        Ok(first_requirement + second.value())
    } else {
        Ok(second_requirement + first.value())
    }
}

// ----------------------------------------------------------------------------
// Butterflies and condors
// ----------------------------------------------------------------------------

/// Long wings risk only the premium; short wings are bounded by the narrower
/// wing
pub fn butterfly(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let options = legs.options_by_strike();
    let [low, body, high] = options.as_slice() else {
        return Err(MarginError::invariant("butterfly needs three option legs"));
    };
    if !low.is_short() {
        return Ok(Decimal::ZERO);
    }
    Ok(low.width_to(body).min(high.width_to(body)))
}

/// Short inner strikes are bounded by the narrower wing; the reverse
/// position only risks its premium
pub fn iron_condor(legs: &StrategyLegs<'_>) -> Result<Decimal> {
    let options = legs.options_by_strike();
    let [low, low_inner, high_inner, high] = options.as_slice() else {
        return Err(MarginError::invariant("iron condor needs four option legs"));
    };
    if low.is_short() {
        return Ok(Decimal::ZERO);
    }
    Ok(low.width_to(low_inner).min(high.width_to(high_inner)))
}
