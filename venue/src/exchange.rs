//! The trading-venue collaborator consumed by the market maker.
//!
//! Transport, request signing and retry/backoff live behind this trait: a
//! failed call is returned as a [`VenueError`](crate::VenueError) after the
//! implementation has done whatever retrying it does.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::types::{ClosedPnl, InstrumentInfo, OrderAck, OrderId, OrderIntent, Position, Side};

/// A single derivatives venue, scoped to one account.
#[async_trait]
pub trait Venue: Send + Sync {
    /// Verify that the configured credentials are accepted.
    async fn check_auth(&self) -> Result<()>;

    /// Switch the market to cross margin.
    ///
    /// Returns a rejection with code [`MARGIN_ALREADY_CROSS`](crate::MARGIN_ALREADY_CROSS)
    /// when nothing needed to change.
    async fn set_cross_margin(&self, symbol: &str) -> Result<()>;

    /// Tick size and contract denomination for a market.
    async fn get_instrument(&self, symbol: &str) -> Result<InstrumentInfo>;

    async fn cancel_all_orders(&self, symbol: &str) -> Result<()>;

    /// Flatten any open position at market.
    async fn close_position(&self, symbol: &str) -> Result<()>;

    async fn get_last_price(&self, symbol: &str) -> Result<Decimal>;

    /// Available balance of `coin` in the account.
    async fn get_available_balance(&self, coin: &str) -> Result<Decimal>;

    /// Submit orders together. Individually rejected orders are reported with
    /// [`OrderStatus::Rejected`](crate::OrderStatus::Rejected) rather than
    /// failing the whole call.
    async fn place_orders_batch(&self, orders: &[OrderIntent]) -> Result<Vec<OrderAck>>;

    async fn cancel_orders_batch(&self, symbol: &str, order_ids: &[OrderId]) -> Result<()>;

    async fn get_position(&self, symbol: &str) -> Result<Position>;

    /// Place a good-till-cancel limit order that can only shrink the position.
    async fn place_reduce_only_order(
        &self,
        symbol: &str,
        side: Side,
        qty: u64,
        price: Decimal,
    ) -> Result<OrderId>;

    /// Amend a resting order's price and open quantity in place.
    async fn replace_order(
        &self,
        symbol: &str,
        order_id: &OrderId,
        price: Decimal,
        qty: u64,
    ) -> Result<()>;

    /// Attach a stop-loss trigger to the open position.
    async fn set_stop_loss(&self, symbol: &str, stop_price: Decimal) -> Result<()>;

    /// Most recent closed-PnL record for the market.
    async fn get_closed_pnl(&self, symbol: &str) -> Result<ClosedPnl>;

    /// Short name for logs.
    fn venue_name(&self) -> &'static str;
}
