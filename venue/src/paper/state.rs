//! Single-market account state for the paper venue.
//!
//! Orders fill in full at their limit price once the last price trades
//! through them. Fees, funding and margin requirements are not modelled.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{Result, VenueError};
use crate::types::{
    ClosedPnl, ContractKind, InstrumentInfo, OrderAck, OrderId, OrderIntent, OrderStatus, Position,
    Side,
};

pub(crate) const INVALID_PARAMETER: i64 = 10001;
pub(crate) const TOO_MANY_ORDERS: i64 = 10005;
pub(crate) const REDUCE_ONLY_VIOLATION: i64 = 30063;
pub(crate) const NO_POSITION: i64 = 30024;
pub(crate) const INVALID_STOP_PRICE: i64 = 30028;

/// A resting limit order.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub side: Side,
    pub qty: u64,
    pub price: Decimal,
    pub reduce_only: bool,
}

#[derive(Debug, Clone)]
struct OpenPosition {
    side: Side,
    size: u64,
    entry: Decimal,
}

/// Running totals for the position currently being closed.
#[derive(Debug, Clone)]
struct CloseTally {
    side: Side,
    qty: u64,
    entry: Decimal,
    exit: Decimal,
    pnl: Decimal,
}

#[derive(Debug)]
pub(crate) struct MarketState {
    pub instrument: InstrumentInfo,
    pub coin: String,
    pub last_price: Decimal,
    pub wallet_balance: Decimal,
    pub cross_margin: bool,
    pub max_open_orders: Option<usize>,
    orders: BTreeMap<u64, RestingOrder>,
    next_order_id: u64,
    position: Option<OpenPosition>,
    stop_loss: Option<Decimal>,
    closing: Option<CloseTally>,
    closed: Vec<ClosedPnl>,
}

impl MarketState {
    pub fn new(
        instrument: InstrumentInfo,
        coin: String,
        last_price: Decimal,
        wallet_balance: Decimal,
        max_open_orders: Option<usize>,
    ) -> Self {
        Self {
            instrument,
            coin,
            last_price,
            wallet_balance,
            cross_margin: false,
            max_open_orders,
            orders: BTreeMap::new(),
            next_order_id: 1,
            position: None,
            stop_loss: None,
            closing: None,
            closed: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    pub fn ensure_symbol(&self, symbol: &str) -> Result<()> {
        if symbol == self.symbol() {
            Ok(())
        } else {
            Err(VenueError::UnknownSymbol(symbol.to_string()))
        }
    }

    pub fn ensure_coin(&self, coin: &str) -> Result<()> {
        if coin == self.coin {
            Ok(())
        } else {
            Err(VenueError::UnknownCoin(coin.to_string()))
        }
    }

    // -----------------------------------------------------------------------
    // Market movement
    // -----------------------------------------------------------------------

    /// Move the last traded price and fill everything it trades through.
    pub fn set_price(&mut self, price: Decimal) {
        self.last_price = price;
        self.check_stop();
        self.match_resting();
    }

    fn check_stop(&mut self) {
        let (Some(stop), Some(pos)) = (self.stop_loss, self.position.as_ref()) else {
            return;
        };
        let hit = match pos.side {
            Side::Buy => self.last_price <= stop,
            Side::Sell => self.last_price >= stop,
        };
        if hit {
            let (side, size) = (pos.side.opposite(), pos.size);
            self.apply_fill(side, size, stop);
        }
    }

    fn match_resting(&mut self) {
        let last = self.last_price;
        let crossing: Vec<u64> = self
            .orders
            .iter()
            .filter(|(_, o)| match o.side {
                Side::Buy => last <= o.price,
                Side::Sell => last >= o.price,
            })
            .map(|(id, _)| *id)
            .collect();

        for id in crossing {
            let Some(order) = self.orders.remove(&id) else {
                continue;
            };
            let qty = if order.reduce_only {
                self.reducible(order.side).min(order.qty)
            } else {
                order.qty
            };
            if qty > 0 {
                self.apply_fill(order.side, qty, order.price);
            }
        }
    }

    /// Contracts an order on `side` could take off the position.
    fn reducible(&self, side: Side) -> u64 {
        match &self.position {
            Some(p) if p.side != side => p.size,
            _ => 0,
        }
    }

    fn apply_fill(&mut self, side: Side, qty: u64, price: Decimal) {
        let contract = self.instrument.contract;
        match self.position.take() {
            None => {
                self.position = Some(OpenPosition {
                    side,
                    size: qty,
                    entry: price,
                });
            }
            Some(mut pos) if pos.side == side => {
                pos.entry = average_price(contract, pos.size, pos.entry, qty, price);
                pos.size += qty;
                self.position = Some(pos);
            }
            Some(pos) => {
                let closed = qty.min(pos.size);
                let pnl = realized_pnl(contract, pos.side, closed, pos.entry, price);
                self.wallet_balance += pnl;

                match self.closing.as_mut() {
                    Some(t) => {
                        t.exit = average_price(contract, t.qty, t.exit, closed, price);
                        t.qty += closed;
                        t.entry = pos.entry;
                        t.pnl += pnl;
                    }
                    None => {
                        self.closing = Some(CloseTally {
                            side: pos.side,
                            qty: closed,
                            entry: pos.entry,
                            exit: price,
                            pnl,
                        });
                    }
                }

                let remaining = pos.size - closed;
                if remaining > 0 {
                    self.position = Some(OpenPosition {
                        size: remaining,
                        ..pos
                    });
                } else {
                    self.finish_close();
                    let flipped = qty - closed;
                    if flipped > 0 {
                        self.position = Some(OpenPosition {
                            side,
                            size: flipped,
                            entry: price,
                        });
                    }
                }
            }
        }
    }

    /// Record the closed-PnL entry and drop what only made sense while open.
    fn finish_close(&mut self) {
        if let Some(t) = self.closing.take() {
            let symbol = self.symbol().to_string();
            self.closed.push(ClosedPnl {
                symbol,
                side: t.side,
                qty: t.qty,
                avg_entry_price: t.entry.round_dp(8),
                avg_exit_price: t.exit.round_dp(8),
                closed_pnl: t.pnl.round_dp(8),
                created_at: Utc::now(),
            });
        }
        self.stop_loss = None;
        self.orders.retain(|_, o| !o.reduce_only);
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Place an order, reporting a rejection in the ack.
    pub fn place(&mut self, intent: &OrderIntent) -> OrderAck {
        self.try_place(intent).unwrap_or_else(|e| OrderAck {
            order_id: OrderId::new(""),
            side: intent.side,
            status: OrderStatus::Rejected,
            reject_reason: Some(e.to_string()),
        })
    }

    pub fn try_place(&mut self, intent: &OrderIntent) -> Result<OrderAck> {
        self.validate(intent)?;

        let id = self.next_order_id;
        self.next_order_id += 1;
        let order_id = OrderId::new(id.to_string());
        self.orders.insert(
            id,
            RestingOrder {
                order_id: order_id.clone(),
                side: intent.side,
                qty: intent.qty,
                price: intent.price,
                reduce_only: intent.reduce_only,
            },
        );
        self.match_resting();

        let status = if self.orders.contains_key(&id) {
            OrderStatus::New
        } else {
            OrderStatus::Filled
        };
        Ok(OrderAck {
            order_id,
            side: intent.side,
            status,
            reject_reason: None,
        })
    }

    fn validate(&self, intent: &OrderIntent) -> Result<()> {
        self.ensure_symbol(&intent.symbol)?;
        if intent.qty == 0 {
            return Err(VenueError::rejected(INVALID_PARAMETER, "qty must be positive"));
        }
        self.validate_price(intent.price)?;
        if let Some(max) = self.max_open_orders {
            if self.orders.len() >= max {
                return Err(VenueError::rejected(
                    TOO_MANY_ORDERS,
                    format!("open order limit of {max} reached"),
                ));
            }
        }
        if intent.reduce_only && self.reducible(intent.side) == 0 {
            return Err(VenueError::rejected(
                REDUCE_ONLY_VIOLATION,
                "reduce-only order would not reduce the position",
            ));
        }
        Ok(())
    }

    fn validate_price(&self, price: Decimal) -> Result<()> {
        if price <= Decimal::ZERO {
            return Err(VenueError::rejected(INVALID_PARAMETER, "price must be positive"));
        }
        let tick = self.instrument.tick_size;
        // A non-positive tick means the market has no price grid.
        if tick > Decimal::ZERO && !(price % tick).is_zero() {
            return Err(VenueError::rejected(
                INVALID_PARAMETER,
                format!("price {price} is not a multiple of tick {}", self.instrument.tick_size),
            ));
        }
        Ok(())
    }

    pub fn cancel(&mut self, order_ids: &[OrderId]) {
        self.orders
            .retain(|_, o| !order_ids.iter().any(|id| *id == o.order_id));
    }

    pub fn cancel_all(&mut self) {
        self.orders.clear();
    }

    pub fn replace(&mut self, order_id: &OrderId, price: Decimal, qty: u64) -> Result<()> {
        if qty == 0 {
            return Err(VenueError::rejected(INVALID_PARAMETER, "qty must be positive"));
        }
        self.validate_price(price)?;
        let order = self
            .orders
            .values_mut()
            .find(|o| o.order_id == *order_id)
            .ok_or_else(|| VenueError::OrderNotFound(order_id.clone()))?;
        order.price = price;
        order.qty = qty;
        self.match_resting();
        Ok(())
    }

    pub fn resting_orders(&self) -> Vec<RestingOrder> {
        self.orders.values().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Position
    // -----------------------------------------------------------------------

    pub fn close_position(&mut self) {
        if let Some(pos) = self.position.as_ref() {
            let (side, size) = (pos.side.opposite(), pos.size);
            self.apply_fill(side, size, self.last_price);
        }
    }

    pub fn set_stop_loss(&mut self, stop: Decimal) -> Result<()> {
        let pos = self
            .position
            .as_ref()
            .ok_or_else(|| VenueError::rejected(NO_POSITION, "no open position"))?;
        let valid = match pos.side {
            Side::Buy => stop < self.last_price,
            Side::Sell => stop > self.last_price,
        };
        if stop <= Decimal::ZERO || !valid {
            return Err(VenueError::rejected(
                INVALID_STOP_PRICE,
                format!("stop {stop} is through last price {}", self.last_price),
            ));
        }
        self.stop_loss = Some(stop);
        Ok(())
    }

    pub fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }

    pub fn position(&self) -> Position {
        let Some(pos) = self.position.as_ref() else {
            return Position::flat(self.symbol(), self.wallet_balance);
        };
        let contract = self.instrument.contract;
        let unrealized = realized_pnl(contract, pos.side, pos.size, pos.entry, self.last_price);
        let notional = match contract {
            ContractKind::Inverse => Decimal::from(pos.size) / self.last_price,
            ContractKind::Linear { contract_size } => {
                Decimal::from(pos.size) * contract_size * self.last_price
            }
        };
        let leverage = if self.wallet_balance > Decimal::ZERO {
            (notional / self.wallet_balance).round_dp(2)
        } else {
            Decimal::ZERO
        };
        Position {
            symbol: self.symbol().to_string(),
            side: pos.side.into(),
            size: pos.size,
            entry_price: pos.entry.round_dp(8),
            unrealized_pnl: unrealized.round_dp(8),
            leverage,
            wallet_balance: self.wallet_balance,
        }
    }

    pub fn latest_closed(&self) -> Option<&ClosedPnl> {
        self.closed.last()
    }

    pub fn closed_history(&self) -> &[ClosedPnl] {
        &self.closed
    }
}

// ---------------------------------------------------------------------------
// Contract math
// ---------------------------------------------------------------------------

/// Size-weighted average of two fills.
///
/// Inverse contracts average harmonically since each contract is a fixed
/// quote amount.
pub(crate) fn average_price(
    contract: ContractKind,
    q1: u64,
    p1: Decimal,
    q2: u64,
    p2: Decimal,
) -> Decimal {
    let (q1, q2) = (Decimal::from(q1), Decimal::from(q2));
    if (q1 + q2).is_zero() {
        return p2;
    }
    match contract {
        ContractKind::Inverse => (q1 + q2) / (q1 / p1 + q2 / p2),
        ContractKind::Linear { .. } => (q1 * p1 + q2 * p2) / (q1 + q2),
    }
}

/// PnL of closing `qty` contracts of a `side` position opened at `entry`.
pub(crate) fn realized_pnl(
    contract: ContractKind,
    side: Side,
    qty: u64,
    entry: Decimal,
    exit: Decimal,
) -> Decimal {
    let qty = Decimal::from(qty);
    let long = match contract {
        ContractKind::Inverse => qty * (Decimal::ONE / entry - Decimal::ONE / exit),
        ContractKind::Linear { contract_size } => qty * contract_size * (exit - entry),
    };
    match side {
        Side::Buy => long,
        Side::Sell => -long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LINEAR: ContractKind = ContractKind::Linear {
        contract_size: Decimal::ONE,
    };

    #[test]
    fn test_linear_average_is_size_weighted() {
        let avg = average_price(LINEAR, 10, dec!(100), 5, dec!(94));
        assert_eq!(avg, dec!(98));
    }

    #[test]
    fn test_inverse_average_is_harmonic() {
        // 100 contracts at 100 and 100 at 200 → 200 / (1 + 0.5)
        let avg = average_price(ContractKind::Inverse, 100, dec!(100), 100, dec!(200));
        assert_eq!(avg.round_dp(6), dec!(133.333333));
    }

    #[test]
    fn test_short_pnl_is_negated() {
        let long = realized_pnl(LINEAR, Side::Buy, 3, dec!(100), dec!(110));
        let short = realized_pnl(LINEAR, Side::Sell, 3, dec!(100), dec!(110));
        assert_eq!(long, dec!(30));
        assert_eq!(short, dec!(-30));
    }

    #[test]
    fn test_inverse_pnl_in_coin() {
        // 1000 contracts, 10000 → 12500: 1000 * (1/10000 - 1/12500) = 0.02
        let pnl = realized_pnl(ContractKind::Inverse, Side::Buy, 1000, dec!(10000), dec!(12500));
        assert_eq!(pnl, dec!(0.02));
    }
}
