//! Position lifecycle, from a resting ladder to a closed position.
//!
//! ```text
//! NoPosition → AwaitingFill → Protecting → Monitoring → Closed
//!                   │
//!                   └── position gone on re-read → NoPosition
//! ```
//!
//! All waiting is polling on `tokio::time`, one venue call at a time.

use rust_decimal::Decimal;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use venue::{OrderId, Position, Side, Venue};

use crate::error::MmError;
use crate::mm::config::MarketMakerConfig;
use crate::mm::ladder::TickRule;
use crate::orders::cancel_side;
use crate::output::StatusLine;
use crate::types::{CycleResult, OrderBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoPosition,
    AwaitingFill,
    Protecting,
    Monitoring,
    Closed,
}

/// The take-profit (and stop) guarding an open position.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectiveOrders {
    pub take_profit_order_id: OrderId,
    /// Open quantity of the take-profit. Never below the position size.
    pub take_profit_qty: u64,
    pub take_profit_price: Decimal,
    pub stop_price: Option<Decimal>,
    /// Take-profit replacements made while monitoring.
    pub resizes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleOutcome {
    Closed {
        result: CycleResult,
        protection: ProtectiveOrders,
    },
    /// The position vanished between detection and protection.
    Reset,
    /// No fill before the configured timeout.
    TimedOut,
    Cancelled,
}

enum FillWait {
    Filled,
    TimedOut,
    Cancelled,
}

/// Take-profit price: `entry ± distance · reference` on the tick grid.
pub fn take_profit_price(
    side: Side,
    entry: Decimal,
    distance: Decimal,
    reference: Decimal,
    tick: &TickRule,
) -> Decimal {
    let offset = distance * reference;
    tick.align(match side {
        Side::Buy => entry + offset,
        Side::Sell => entry - offset,
    })
}

/// Stop price: `entry ∓ distance · entry` on the tick grid.
pub fn stop_price(side: Side, entry: Decimal, distance: Decimal, tick: &TickRule) -> Decimal {
    let offset = distance * entry;
    tick.align(match side {
        Side::Buy => entry - offset,
        Side::Sell => entry + offset,
    })
}

/// Drives one ladder's position from first fill to close.
pub struct PositionLifecycle<'a, V: Venue + ?Sized> {
    venue: &'a V,
    config: &'a MarketMakerConfig,
    tick: TickRule,
    reference_price: Decimal,
    phase: Phase,
}

impl<'a, V: Venue + ?Sized> PositionLifecycle<'a, V> {
    pub fn new(
        venue: &'a V,
        config: &'a MarketMakerConfig,
        tick: TickRule,
        reference_price: Decimal,
    ) -> Self {
        Self {
            venue,
            config,
            tick,
            reference_price,
            phase: Phase::NoPosition,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }

    /// Run the lifecycle for a freshly placed ladder.
    pub async fn run(
        &mut self,
        mut book: OrderBook,
        status: &mut StatusLine,
        cancel: &CancellationToken,
    ) -> Result<LifecycleOutcome, MmError> {
        let config = self.config;
        let symbol = config.symbol.as_str();
        self.enter(Phase::AwaitingFill);

        match self.await_fill(cancel).await? {
            FillWait::Filled => {}
            FillWait::TimedOut => {
                info!(timeout = ?self.config.fill_timeout, "no fill, re-laddering");
                self.enter(Phase::NoPosition);
                return Ok(LifecycleOutcome::TimedOut);
            }
            FillWait::Cancelled => return Ok(LifecycleOutcome::Cancelled),
        }

        // --- Protecting ---
        let position = self.venue.get_position(symbol).await?;
        let Some(side) = open_side(&position) else {
            info!("position closed before protection, resetting");
            self.enter(Phase::NoPosition);
            return Ok(LifecycleOutcome::Reset);
        };
        self.enter(Phase::Protecting);
        cancel_side(self.venue, symbol, &mut book, side.opposite()).await?;

        // Sized from the read after the cancel; fills may have landed in between.
        let position = self.venue.get_position(symbol).await?;
        let Some(side) = open_side(&position) else {
            info!("position closed while cancelling, resetting");
            self.enter(Phase::NoPosition);
            return Ok(LifecycleOutcome::Reset);
        };
        let mut protection = self.protect(side, &position).await?;

        // --- Monitoring ---
        self.enter(Phase::Monitoring);
        let interval = self.config.poll_interval();
        let mut position = position;
        loop {
            status.update(&position)?;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    status.finish()?;
                    info!(size = position.size, "stopped while monitoring, position left open");
                    return Ok(LifecycleOutcome::Cancelled);
                }
                _ = time::sleep(interval) => {}
            }

            position = self.venue.get_position(symbol).await?;
            if !position.is_open() {
                break;
            }

            if position.size > protection.take_profit_qty {
                let price = take_profit_price(
                    side,
                    position.entry_price,
                    self.config.take_profit_distance,
                    self.reference_price,
                    &self.tick,
                );
                self.venue
                    .replace_order(symbol, &protection.take_profit_order_id, price, position.size)
                    .await?;
                info!(
                    from = protection.take_profit_qty,
                    to = position.size,
                    entry = %position.entry_price,
                    price = %price,
                    "RESIZE"
                );
                protection.take_profit_qty = position.size;
                protection.take_profit_price = price;
                protection.resizes += 1;
            } else if position.size < protection.take_profit_qty {
                // Partly taken out; the remaining take-profit shrank with it.
                protection.take_profit_qty = position.size;
            }
        }
        status.finish()?;

        // --- Closed ---
        self.enter(Phase::Closed);
        let result = CycleResult::from(self.venue.get_closed_pnl(symbol).await?);
        info!(
            side = %result.side,
            qty = result.quantity,
            entry = %result.entry_price,
            exit = %result.exit_price,
            pnl = %result.closed_pnl,
            "CLOSED"
        );
        Ok(LifecycleOutcome::Closed { result, protection })
    }

    async fn await_fill(&self, cancel: &CancellationToken) -> Result<FillWait, MmError> {
        let symbol = self.config.symbol.as_str();
        let deadline = self.config.fill_timeout.map(|t| Instant::now() + t);
        let interval = self.config.poll_interval();

        loop {
            let position = self.venue.get_position(symbol).await?;
            if position.is_open() {
                info!(
                    side = ?position.side,
                    size = position.size,
                    entry = %position.entry_price,
                    "FILL"
                );
                return Ok(FillWait::Filled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(FillWait::TimedOut);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(FillWait::Cancelled),
                _ = time::sleep(interval) => {}
            }
        }
    }

    async fn protect(&self, side: Side, position: &Position) -> Result<ProtectiveOrders, MmError> {
        let symbol = self.config.symbol.as_str();
        let tp_price = take_profit_price(
            side,
            position.entry_price,
            self.config.take_profit_distance,
            self.reference_price,
            &self.tick,
        );
        let tp_side = side.opposite();
        let take_profit_order_id = self
            .venue
            .place_reduce_only_order(symbol, tp_side, position.size, tp_price)
            .await?;
        info!(
            side = %tp_side,
            qty = position.size,
            price = %tp_price,
            order_id = %take_profit_order_id,
            "TP"
        );

        let stop = match self.config.active_stop_distance() {
            Some(distance) => {
                let price = stop_price(side, position.entry_price, distance, &self.tick);
                self.venue.set_stop_loss(symbol, price).await?;
                info!(price = %price, "STOP");
                Some(price)
            }
            None => None,
        };

        Ok(ProtectiveOrders {
            take_profit_order_id,
            take_profit_qty: position.size,
            take_profit_price: tp_price,
            stop_price: stop,
            resizes: 0,
        })
    }
}

fn open_side(position: &Position) -> Option<Side> {
    if position.is_open() {
        position.side.as_side()
    } else {
        None
    }
}
