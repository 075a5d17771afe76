//! Ladder generation: order sizes and price levels around a reference price.
//!
//! Uses `rust_decimal::Decimal` throughout so that truncation and tick
//! alignment are exact.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use venue::ContractKind;

use crate::error::ConfigError;

/// Signed order sizes for a ladder of `depth` levels per side.
///
/// The allocation is split by the triangular number `(depth + depth²) / 2`
/// into a unit `u`; the buy side is `[⌊u·depth⌋, …, ⌊u·1⌋]` and the sell side
/// mirrors it negated, giving `[long_depth, …, long_1, short_1, …, short_depth]`.
/// Paired with ascending prices, the largest orders sit at the outer edges.
///
/// Sizes are truncated, so neither side ever sums above `total_allocation`.
pub fn generate_quantities(total_allocation: Decimal, depth: usize) -> Result<Vec<i64>, ConfigError> {
    if depth == 0 {
        return Err(ConfigError::invalid("depth", "must be at least 1"));
    }
    if total_allocation <= Decimal::ZERO {
        return Err(ConfigError::invalid("total_allocation", "must be positive"));
    }

    let triangular = Decimal::from((depth + depth * depth) / 2);
    let long = (1..=depth)
        .rev()
        .map(|k| {
            total_allocation
                .checked_mul(Decimal::from(k))
                .map(|scaled| (scaled / triangular).floor())
                .and_then(|q| q.to_i64())
                .ok_or_else(|| ConfigError::invalid("total_allocation", "too large"))
        })
        .collect::<Result<Vec<i64>, _>>()?;

    let mut ladder = Vec::with_capacity(2 * depth);
    ladder.extend(long.iter().copied());
    ladder.extend(long.iter().rev().map(|q| -q));
    Ok(ladder)
}

/// Lowest and highest ladder price: `reference · (1 ± spread/2)`.
pub fn ladder_bounds(reference_price: Decimal, spread_fraction: Decimal) -> (Decimal, Decimal) {
    let half = reference_price * spread_fraction / dec!(2);
    (reference_price - half, reference_price + half)
}

/// `2 · depth` evenly spaced prices across [`ladder_bounds`], endpoints
/// included, ascending.
pub fn generate_prices(
    reference_price: Decimal,
    spread_fraction: Decimal,
    depth: usize,
) -> Result<Vec<Decimal>, ConfigError> {
    if depth == 0 {
        return Err(ConfigError::invalid("depth", "must be at least 1"));
    }
    if reference_price <= Decimal::ZERO {
        return Err(ConfigError::invalid("reference_price", "must be positive"));
    }
    if spread_fraction <= Decimal::ZERO {
        return Err(ConfigError::invalid("price_spread", "must be positive"));
    }

    let (low, high) = ladder_bounds(reference_price, spread_fraction);
    let count = 2 * depth;
    let step = (high - low) / Decimal::from(count - 1);

    let mut prices: Vec<Decimal> = (0..count).map(|i| low + step * Decimal::from(i)).collect();
    // Pin the top level so division rounding never leaves it short of `high`.
    if let Some(top) = prices.last_mut() {
        *top = high;
    }
    Ok(prices)
}

/// Rounding direction for tick alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RoundMode {
    #[default]
    Floor,
    Ceil,
    Nearest,
}

/// Venue price granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRule {
    tick_size: Decimal,
    mode: RoundMode,
}

impl TickRule {
    pub fn new(tick_size: Decimal, mode: RoundMode) -> Self {
        Self { tick_size, mode }
    }

    /// Align a price to the tick size.
    pub fn align(&self, price: Decimal) -> Decimal {
        if self.tick_size <= Decimal::ZERO {
            return price;
        }
        let ticks = price / self.tick_size;
        let aligned = match self.mode {
            RoundMode::Floor => ticks.floor(),
            RoundMode::Ceil => ticks.ceil(),
            RoundMode::Nearest => ticks.round(),
        };
        (aligned * self.tick_size).normalize()
    }
}

/// Quote-currency value of `capital_fraction` of an available balance.
///
/// Inverse markets hold the balance in the base coin, so it is valued at
/// `price`.
pub fn quote_allocation(
    contract: ContractKind,
    balance: Decimal,
    price: Decimal,
    capital_fraction: Decimal,
) -> Decimal {
    match contract {
        ContractKind::Inverse => balance * price * capital_fraction,
        ContractKind::Linear { .. } => balance * capital_fraction,
    }
}

/// Contracts per ladder side for a quote-currency allocation.
///
/// Linear contracts are sized against the highest ladder price, so each
/// side's notional at its own prices stays within `allocation`.
pub fn contracts_for_allocation(
    contract: ContractKind,
    allocation: Decimal,
    highest_price: Decimal,
) -> Decimal {
    match contract {
        ContractKind::Inverse => allocation,
        ContractKind::Linear { contract_size } => {
            let per_contract = contract_size * highest_price;
            if per_contract <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            (allocation / per_contract).round_dp_with_strategy(8, RoundingStrategy::ToZero)
        }
    }
}
