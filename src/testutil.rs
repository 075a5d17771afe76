//! Scripted venue for driving the controller in tests.

use std::collections::{BTreeSet, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use venue::{
    ClosedPnl, ContractKind, InstrumentInfo, OrderAck, OrderId, OrderIntent, OrderStatus,
    Position, PositionSide, Result, Side, Venue, VenueError,
};

/// Venue call as recorded by [`MockVenue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckAuth,
    SetCrossMargin,
    CancelAll,
    ClosePosition,
    PlaceBatch(Vec<OrderIntent>),
    CancelBatch(Vec<OrderId>),
    ReduceOnly { side: Side, qty: u64, price: Decimal },
    Replace { order_id: OrderId, price: Decimal, qty: u64 },
    StopLoss(Decimal),
    GetClosedPnl,
}

struct Script {
    positions: VecDeque<Position>,
    rejected: BTreeSet<usize>,
    auth_error: Option<VenueError>,
    cross_margin_error: Option<VenueError>,
    closed_pnl: Option<ClosedPnl>,
    calls: Vec<Call>,
    position_reads: usize,
}

/// Replays a queue of positions (the last one repeats) and echoes ladder
/// orders back with ids derived from their contents.
pub struct MockVenue {
    pub last_price: Decimal,
    pub balance: Decimal,
    pub instrument: InstrumentInfo,
    script: Mutex<Script>,
}

impl MockVenue {
    pub fn new() -> Self {
        Self {
            last_price: dec!(100),
            balance: dec!(1),
            instrument: InstrumentInfo {
                symbol: "BTCUSD".into(),
                tick_size: dec!(1),
                contract: ContractKind::Inverse,
            },
            script: Mutex::new(Script {
                positions: VecDeque::new(),
                rejected: BTreeSet::new(),
                auth_error: None,
                cross_margin_error: None,
                closed_pnl: None,
                calls: Vec::new(),
                position_reads: 0,
            }),
        }
    }

    pub fn with_positions(self, positions: Vec<Position>) -> Self {
        self.script.lock().positions = positions.into();
        self
    }

    /// Reject the batch entries at these indices.
    pub fn rejecting(self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.script.lock().rejected.extend(indices);
        self
    }

    pub fn with_closed_pnl(self, pnl: ClosedPnl) -> Self {
        self.script.lock().closed_pnl = Some(pnl);
        self
    }

    pub fn failing_auth(self, err: VenueError) -> Self {
        self.script.lock().auth_error = Some(err);
        self
    }

    pub fn failing_cross_margin(self, err: VenueError) -> Self {
        self.script.lock().cross_margin_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn replaces(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Replace { .. }))
            .collect()
    }

    pub fn position_reads(&self) -> usize {
        self.script.lock().position_reads
    }

    fn record(&self, call: Call) {
        self.script.lock().calls.push(call);
    }
}

pub fn position(side: PositionSide, size: u64, entry: Decimal) -> Position {
    Position {
        symbol: "BTCUSD".into(),
        side,
        size,
        entry_price: entry,
        unrealized_pnl: Decimal::ZERO,
        leverage: dec!(1),
        wallet_balance: dec!(1),
    }
}

pub fn flat() -> Position {
    Position::flat("BTCUSD", dec!(1))
}

pub fn closed(side: Side, qty: u64, entry: Decimal, exit: Decimal, pnl: Decimal) -> ClosedPnl {
    ClosedPnl {
        symbol: "BTCUSD".into(),
        side,
        qty,
        avg_entry_price: entry,
        avg_exit_price: exit,
        closed_pnl: pnl,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Venue for MockVenue {
    async fn check_auth(&self) -> Result<()> {
        self.record(Call::CheckAuth);
        match self.script.lock().auth_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn set_cross_margin(&self, _symbol: &str) -> Result<()> {
        self.record(Call::SetCrossMargin);
        match self.script.lock().cross_margin_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_instrument(&self, _symbol: &str) -> Result<InstrumentInfo> {
        Ok(self.instrument.clone())
    }

    async fn cancel_all_orders(&self, _symbol: &str) -> Result<()> {
        self.record(Call::CancelAll);
        Ok(())
    }

    async fn close_position(&self, _symbol: &str) -> Result<()> {
        self.record(Call::ClosePosition);
        Ok(())
    }

    async fn get_last_price(&self, _symbol: &str) -> Result<Decimal> {
        Ok(self.last_price)
    }

    async fn get_available_balance(&self, _coin: &str) -> Result<Decimal> {
        Ok(self.balance)
    }

    async fn place_orders_batch(&self, orders: &[OrderIntent]) -> Result<Vec<OrderAck>> {
        self.record(Call::PlaceBatch(orders.to_vec()));
        let rejected = self.script.lock().rejected.clone();
        Ok(orders
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let id = OrderId::new(format!("{}-{}-{}", o.side, o.price, o.qty));
                if rejected.contains(&i) {
                    OrderAck {
                        order_id: id,
                        side: o.side,
                        status: OrderStatus::Rejected,
                        reject_reason: Some("insufficient margin".into()),
                    }
                } else {
                    OrderAck {
                        order_id: id,
                        side: o.side,
                        status: OrderStatus::New,
                        reject_reason: None,
                    }
                }
            })
            .collect())
    }

    async fn cancel_orders_batch(&self, _symbol: &str, order_ids: &[OrderId]) -> Result<()> {
        self.record(Call::CancelBatch(order_ids.to_vec()));
        Ok(())
    }

    async fn get_position(&self, symbol: &str) -> Result<Position> {
        let mut script = self.script.lock();
        script.position_reads += 1;
        let next = if script.positions.len() > 1 {
            script.positions.pop_front()
        } else {
            script.positions.front().cloned()
        };
        Ok(next.unwrap_or_else(|| Position::flat(symbol, Decimal::ONE)))
    }

    async fn place_reduce_only_order(
        &self,
        _symbol: &str,
        side: Side,
        qty: u64,
        price: Decimal,
    ) -> Result<OrderId> {
        self.record(Call::ReduceOnly { side, qty, price });
        Ok(OrderId::from("tp-1"))
    }

    async fn replace_order(
        &self,
        _symbol: &str,
        order_id: &OrderId,
        price: Decimal,
        qty: u64,
    ) -> Result<()> {
        self.record(Call::Replace {
            order_id: order_id.clone(),
            price,
            qty,
        });
        Ok(())
    }

    async fn set_stop_loss(&self, _symbol: &str, stop_price: Decimal) -> Result<()> {
        self.record(Call::StopLoss(stop_price));
        Ok(())
    }

    async fn get_closed_pnl(&self, symbol: &str) -> Result<ClosedPnl> {
        self.record(Call::GetClosedPnl);
        self.script
            .lock()
            .closed_pnl
            .clone()
            .ok_or_else(|| VenueError::NoClosedPnl(symbol.to_string()))
    }

    fn venue_name(&self) -> &'static str {
        "mock"
    }
}
