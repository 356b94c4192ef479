//! Partitioning of flat holdings into strategy and naked groups

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::group::PositionGroup;
use super::position::PositionCollection;
use crate::common::errors::{MarginError, Result};
use crate::common::types::{signum, OptionContract, Symbol};
use crate::config::types::{ResolverSettings, TieBreak};
use crate::securities::SecurityManager;
use crate::strategy::{
    LegTemplate, StrategyCatalog, StrategyDefinition, StrategyId, OPTION_STRATEGY_CATALOG,
};

/// A complete assignment of positions to a strategy's legs
#[derive(Debug, Clone)]
struct Candidate {
    strategy: StrategyId,
    catalog_index: usize,
    /// Signed number of strategy units
    quantity: Decimal,
    /// Symbol and signed unit ratio per leg, in template order
    legs: Vec<(Symbol, Decimal)>,
}

impl Candidate {
    /// Lots of position quantity this match explains
    fn explained(&self) -> Decimal {
        self.quantity.abs() * Decimal::from(self.legs.len())
    }

    fn is_template_side(&self) -> bool {
        self.quantity.is_sign_positive()
    }

    fn into_group(self) -> PositionGroup {
        PositionGroup::for_strategy(self.strategy, self.quantity, self.legs)
    }
}

/// Depth-first leg assignment state
struct Search<'a> {
    definition: &'a StrategyDefinition,
    catalog_index: usize,
    symbols: &'a [Symbol],
    remaining: &'a BTreeMap<Symbol, Decimal>,
    securities: &'a SecurityManager,
    assigned: Vec<(Symbol, Decimal)>,
    found: Vec<Candidate>,
}

impl<'a> Search<'a> {
    fn run(mut self) -> Result<Vec<Candidate>> {
        self.assign(0)?;
        Ok(self.found)
    }

    fn assigned_contracts(&self) -> Vec<&'a OptionContract> {
        self.assigned
            .iter()
            .filter_map(|(symbol, _)| {
                self.symbols
                    .iter()
                    .find(|s| *s == symbol)
                    .and_then(|s| s.contract())
            })
            .collect()
    }

    /// Whether holding `symbol` against `ratio` keeps every leg on one side
    fn consistent(&self, symbol: &Symbol, ratio: Decimal) -> bool {
        let held = self.remaining.get(symbol).copied().unwrap_or_default();
        if held.is_zero() || held.abs() < ratio.abs() {
            return false;
        }
        let side = signum(held) * signum(ratio);
        match self.assigned.first() {
            Some((first, first_ratio)) => {
                let first_held = self.remaining.get(first).copied().unwrap_or_default();
                signum(first_held) * signum(*first_ratio) == side
            }
            None => true,
        }
    }

    fn assign(&mut self, index: usize) -> Result<()> {
        let Some(template) = self.definition.legs.get(index) else {
            self.record();
            return Ok(());
        };

        match *template {
            LegTemplate::Underlying { direction } => {
                let Some((first_option, _)) = self.assigned.first() else {
                    return Ok(());
                };
                let multiplier = self.securities.get(first_option)?.contract_multiplier();
                let symbol = first_option.underlying_symbol();
                let ratio = Decimal::from(direction) * multiplier;
                if self.symbols.contains(&symbol) && self.consistent(&symbol, ratio) {
                    self.assigned.push((symbol, ratio));
                    self.assign(index + 1)?;
                    self.assigned.pop();
                }
            }
            LegTemplate::Option {
                right,
                ratio,
                strike,
                expiry,
            } => {
                let ratio = Decimal::from(ratio);
                for symbol in self.symbols {
                    let Some(contract) = symbol.contract() else {
                        continue;
                    };
                    if contract.right != right
                        || self.assigned.iter().any(|(s, _)| s == symbol)
                    {
                        continue;
                    }
                    let matched = self.assigned_contracts();
                    if !strike.accepts(contract.strike, &matched)
                        || !expiry.accepts(contract, &matched)
                        || !self.consistent(symbol, ratio)
                    {
                        continue;
                    }
                    self.assigned.push((symbol.clone(), ratio));
                    self.assign(index + 1)?;
                    self.assigned.pop();
                }
            }
        }
        Ok(())
    }

    fn record(&mut self) {
        let Some((first, first_ratio)) = self.assigned.first() else {
            return;
        };
        let held = self.remaining.get(first).copied().unwrap_or_default();
        let side = signum(held) * signum(*first_ratio);

        let units = self
            .assigned
            .iter()
            .map(|(symbol, ratio)| {
                let held = self.remaining.get(symbol).copied().unwrap_or_default();
                (held.abs() / ratio.abs()).floor()
            })
            .min()
            .unwrap_or_default();
        if units < Decimal::ONE {
            return;
        }

        self.found.push(Candidate {
            strategy: self.definition.id,
            catalog_index: self.catalog_index,
            quantity: units * side,
            legs: self.assigned.clone(),
        });
    }
}

/// Greedy strategy matcher
///
/// Repeatedly takes the candidate explaining the most lots (then most legs,
/// then the template side, then catalog order), subtracts it, and finally
/// groups whatever is left as naked positions.
#[derive(Debug, Clone)]
pub struct PositionGroupResolver {
    settings: ResolverSettings,
    catalog: &'static StrategyCatalog,
}

impl Default for PositionGroupResolver {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

impl PositionGroupResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            catalog: &OPTION_STRATEGY_CATALOG,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Partition `positions` into margin-minimizing groups
    pub fn resolve(
        &self,
        positions: &PositionCollection,
        securities: &SecurityManager,
    ) -> Result<Vec<PositionGroup>> {
        self.resolve_with_preference(positions, securities, None)
    }

    /// Partition `positions`, matching `preferred` first when it fits
    ///
    /// A preferred strategy that cannot be matched is logged and ignored.
    pub fn resolve_with_preference(
        &self,
        positions: &PositionCollection,
        securities: &SecurityManager,
        preferred: Option<StrategyId>,
    ) -> Result<Vec<PositionGroup>> {
        let mut remaining: BTreeMap<Symbol, Decimal> =
            positions.iter().map(|(s, q)| (s.clone(), q)).collect();
        let mut groups = Vec::new();

        if let Some(strategy) = preferred {
            match self.best_match_for(strategy, &remaining, securities) {
                Ok(candidate) => {
                    subtract(&mut remaining, &candidate);
                    groups.push(candidate.into_group());
                }
                Err(err) if !err.is_fatal() => {
                    warn!(strategy = %strategy, error = %err, "Preferred strategy not applicable, resolving normally");
                }
                Err(err) => return Err(err),
            }
        }

        for symbols in by_underlying(&remaining) {
            while let Some(candidate) = self.best_candidate(&symbols, &remaining, securities)? {
                debug!(
                    strategy = %candidate.strategy,
                    quantity = %candidate.quantity,
                    legs = candidate.legs.len(),
                    "Matched option strategy"
                );
                subtract(&mut remaining, &candidate);
                groups.push(candidate.into_group());
            }
        }

        for (symbol, quantity) in remaining {
            groups.push(PositionGroup::naked(symbol, quantity));
        }

        verify_partition(positions, &groups)?;
        Ok(groups)
    }

    /// Single strategy group explaining all of `positions`
    pub fn group_as(
        &self,
        strategy: StrategyId,
        positions: &PositionCollection,
        securities: &SecurityManager,
    ) -> Result<PositionGroup> {
        let remaining: BTreeMap<Symbol, Decimal> =
            positions.iter().map(|(s, q)| (s.clone(), q)).collect();
        let candidates = self.candidates_for(strategy, &remaining, securities)?;

        candidates
            .into_iter()
            .find(|candidate| {
                candidate.legs.len() == remaining.len()
                    && candidate.legs.iter().all(|(symbol, ratio)| {
                        remaining.get(symbol).copied() == Some(*ratio * candidate.quantity)
                    })
            })
            .map(Candidate::into_group)
            .ok_or_else(|| MarginError::UnresolvableStrategy {
                strategy: strategy.name().to_string(),
                reason: "positions do not form a whole number of strategy units".to_string(),
            })
    }

    fn candidates_for(
        &self,
        strategy: StrategyId,
        remaining: &BTreeMap<Symbol, Decimal>,
        securities: &SecurityManager,
    ) -> Result<Vec<Candidate>> {
        let (Some(index), Some(definition)) =
            (self.catalog.position(strategy), self.catalog.get(strategy))
        else {
            return Err(MarginError::UnresolvableStrategy {
                strategy: strategy.name().to_string(),
                reason: "strategy is not in the catalog".to_string(),
            });
        };

        let mut candidates = Vec::new();
        for symbols in by_underlying(remaining) {
            candidates.extend(search(definition, index, &symbols, remaining, securities)?);
        }
        Ok(candidates)
    }

    fn best_match_for(
        &self,
        strategy: StrategyId,
        remaining: &BTreeMap<Symbol, Decimal>,
        securities: &SecurityManager,
    ) -> Result<Candidate> {
        let candidates = self.candidates_for(strategy, remaining, securities)?;
        self.pick(candidates)
            .ok_or_else(|| MarginError::UnresolvableStrategy {
                strategy: strategy.name().to_string(),
                reason: "no holdings match the strategy legs".to_string(),
            })
    }

    fn best_candidate(
        &self,
        symbols: &[Symbol],
        remaining: &BTreeMap<Symbol, Decimal>,
        securities: &SecurityManager,
    ) -> Result<Option<Candidate>> {
        let mut candidates = Vec::new();
        for (index, definition) in self.catalog.iter() {
            candidates.extend(search(definition, index, symbols, remaining, securities)?);
        }
        Ok(self.pick(candidates))
    }

    /// Highest ranked candidate; the earliest found wins exact ties
    fn pick(&self, candidates: Vec<Candidate>) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for candidate in candidates {
            let replace = match &best {
                None => true,
                Some(current) => {
                    if self.rank_without_catalog(&candidate, current) == Ordering::Equal
                        && candidate.strategy != current.strategy
                    {
                        debug!(
                            first = %current.strategy,
                            second = %candidate.strategy,
                            tie_break = ?self.settings.tie_break,
                            "Strategies explain the same positions equally, falling back to catalog order"
                        );
                    }
                    self.rank(&candidate, current) == Ordering::Greater
                }
            };
            if replace {
                best = Some(candidate);
            }
        }
        best
    }

    fn rank_without_catalog(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let side = if self.settings.prefer_template_side {
            a.is_template_side().cmp(&b.is_template_side())
        } else {
            Ordering::Equal
        };
        a.explained()
            .cmp(&b.explained())
            .then(a.legs.len().cmp(&b.legs.len()))
            .then(side)
    }

    fn rank(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let catalog = match self.settings.tie_break {
            TieBreak::CatalogOrder => b.catalog_index.cmp(&a.catalog_index),
            TieBreak::ReverseCatalogOrder => a.catalog_index.cmp(&b.catalog_index),
        };
        self.rank_without_catalog(a, b).then(catalog)
    }
}

fn search(
    definition: &StrategyDefinition,
    catalog_index: usize,
    symbols: &[Symbol],
    remaining: &BTreeMap<Symbol, Decimal>,
    securities: &SecurityManager,
) -> Result<Vec<Candidate>> {
    Search {
        definition,
        catalog_index,
        symbols,
        remaining,
        securities,
        assigned: Vec::with_capacity(definition.leg_count()),
        found: Vec::new(),
    }
    .run()
}

/// Sorted symbols with open quantity, bucketed by underlying ticker
fn by_underlying(remaining: &BTreeMap<Symbol, Decimal>) -> Vec<Vec<Symbol>> {
    let mut buckets: BTreeMap<&str, Vec<Symbol>> = BTreeMap::new();
    for (symbol, quantity) in remaining {
        if !quantity.is_zero() {
            buckets
                .entry(symbol.underlying.as_str())
                .or_default()
                .push(symbol.clone());
        }
    }
    buckets.into_values().collect()
}

fn subtract(remaining: &mut BTreeMap<Symbol, Decimal>, candidate: &Candidate) {
    for (symbol, ratio) in &candidate.legs {
        if let Some(held) = remaining.get_mut(symbol) {
            *held -= *ratio * candidate.quantity;
            if held.is_zero() {
                remaining.remove(symbol);
            }
        }
    }
}

/// Every symbol's quantity must be accounted for exactly once
fn verify_partition(positions: &PositionCollection, groups: &[PositionGroup]) -> Result<()> {
    let grouped: PositionCollection = groups
        .iter()
        .flat_map(|group| group.positions())
        .map(|p| (p.symbol().clone(), p.quantity()))
        .collect();

    if &grouped != positions {
        return Err(MarginError::invariant(format!(
            "resolved groups hold {:?} but positions were {:?}",
            grouped, positions
        )));
    }
    Ok(())
}
