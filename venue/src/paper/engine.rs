use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::state::{MarketState, RestingOrder};
use crate::error::{Result, VenueError, MARGIN_ALREADY_CROSS};
use crate::exchange::Venue;
use crate::types::{
    ClosedPnl, ContractKind, InstrumentInfo, OrderAck, OrderId, OrderIntent, Position, Side,
    TimeInForce,
};

/// Parameters for a simulated market.
#[derive(Debug, Clone)]
pub struct PaperConfig {
    pub symbol: String,
    /// Settlement coin whose balance the account holds.
    pub coin: String,
    pub tick_size: Decimal,
    pub contract: ContractKind,
    pub initial_price: Decimal,
    pub wallet_balance: Decimal,
    /// Orders beyond this many resting are rejected.
    pub max_open_orders: Option<usize>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSD".into(),
            coin: "BTC".into(),
            tick_size: dec!(0.5),
            contract: ContractKind::Inverse,
            initial_price: dec!(30000),
            wallet_balance: dec!(1),
            max_open_orders: Some(500),
        }
    }
}

/// Paper-trading implementation of [`Venue`].
#[derive(Debug)]
pub struct PaperVenue {
    state: Mutex<MarketState>,
}

impl PaperVenue {
    pub fn new(config: PaperConfig) -> Self {
        let instrument = InstrumentInfo {
            symbol: config.symbol,
            tick_size: config.tick_size,
            contract: config.contract,
        };
        Self {
            state: Mutex::new(MarketState::new(
                instrument,
                config.coin,
                config.initial_price,
                config.wallet_balance,
                config.max_open_orders,
            )),
        }
    }

    /// Trade the market at `price`, filling any order or stop it crosses.
    pub fn set_price(&self, price: Decimal) {
        self.state.lock().set_price(price);
    }

    pub fn last_price(&self) -> Decimal {
        self.state.lock().last_price
    }

    pub fn tick_size(&self) -> Decimal {
        self.state.lock().instrument.tick_size
    }

    pub fn resting_orders(&self) -> Vec<RestingOrder> {
        self.state.lock().resting_orders()
    }

    pub fn stop_loss(&self) -> Option<Decimal> {
        self.state.lock().stop_loss()
    }

    pub fn closed_pnl_history(&self) -> Vec<ClosedPnl> {
        self.state.lock().closed_history().to_vec()
    }

    pub fn position_snapshot(&self) -> Position {
        self.state.lock().position()
    }
}

#[async_trait]
impl Venue for PaperVenue {
    async fn check_auth(&self) -> Result<()> {
        Ok(())
    }

    async fn set_cross_margin(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        if state.cross_margin {
            return Err(VenueError::rejected(
                MARGIN_ALREADY_CROSS,
                "margin mode is already cross",
            ));
        }
        state.cross_margin = true;
        Ok(())
    }

    async fn get_instrument(&self, symbol: &str) -> Result<InstrumentInfo> {
        let state = self.state.lock();
        state.ensure_symbol(symbol)?;
        Ok(state.instrument.clone())
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state.cancel_all();
        Ok(())
    }

    async fn close_position(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state.close_position();
        Ok(())
    }

    async fn get_last_price(&self, symbol: &str) -> Result<Decimal> {
        let state = self.state.lock();
        state.ensure_symbol(symbol)?;
        Ok(state.last_price)
    }

    async fn get_available_balance(&self, coin: &str) -> Result<Decimal> {
        let state = self.state.lock();
        state.ensure_coin(coin)?;
        Ok(state.wallet_balance)
    }

    async fn place_orders_batch(&self, orders: &[OrderIntent]) -> Result<Vec<OrderAck>> {
        let mut state = self.state.lock();
        let acks: Vec<OrderAck> = orders.iter().map(|o| state.place(o)).collect();
        debug!(
            submitted = orders.len(),
            accepted = acks.iter().filter(|a| a.status.is_accepted()).count(),
            "paper batch placed"
        );
        Ok(acks)
    }

    async fn cancel_orders_batch(&self, symbol: &str, order_ids: &[OrderId]) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state.cancel(order_ids);
        Ok(())
    }

    async fn get_position(&self, symbol: &str) -> Result<Position> {
        let state = self.state.lock();
        state.ensure_symbol(symbol)?;
        Ok(state.position())
    }

    async fn place_reduce_only_order(
        &self,
        symbol: &str,
        side: Side,
        qty: u64,
        price: Decimal,
    ) -> Result<OrderId> {
        let intent = OrderIntent {
            symbol: symbol.to_string(),
            side,
            qty,
            price,
            time_in_force: TimeInForce::GoodTillCancel,
            reduce_only: true,
        };
        let ack = self.state.lock().try_place(&intent)?;
        Ok(ack.order_id)
    }

    async fn replace_order(
        &self,
        symbol: &str,
        order_id: &OrderId,
        price: Decimal,
        qty: u64,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state.replace(order_id, price, qty)
    }

    async fn set_stop_loss(&self, symbol: &str, stop_price: Decimal) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state.set_stop_loss(stop_price)
    }

    async fn get_closed_pnl(&self, symbol: &str) -> Result<ClosedPnl> {
        let state = self.state.lock();
        state.ensure_symbol(symbol)?;
        state
            .latest_closed()
            .cloned()
            .ok_or_else(|| VenueError::NoClosedPnl(symbol.to_string()))
    }

    fn venue_name(&self) -> &'static str {
        "paper"
    }
}
