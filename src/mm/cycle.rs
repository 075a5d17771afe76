//! Market maker orchestrator.
//!
//! Each cycle starts from a clean slate (no orders, no position), lays a
//! fresh ladder around the last price and hands it to the
//! [`PositionLifecycle`]. Cycles repeat until cancelled or `max_cycles`.

use std::io::{self, Write};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use venue::{Venue, MARGIN_ALREADY_CROSS};

use crate::error::MmError;
use crate::mm::config::MarketMakerConfig;
use crate::mm::ladder::{contracts_for_allocation, ladder_bounds, quote_allocation, TickRule};
use crate::mm::lifecycle::{LifecycleOutcome, PositionLifecycle};
use crate::orders::submit_ladder;
use crate::output::{write_cycle, StatusLine};
use crate::types::LadderConfig;

/// Totals for one run of the market maker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub cycles: u64,
    pub closed: u64,
    pub resets: u64,
    pub timeouts: u64,
    /// Cycles whose ladder was rejected outright.
    pub failed: u64,
    pub realized_pnl: Decimal,
}

/// Top-level market maker.
pub struct MarketMaker<V: Venue + ?Sized> {
    config: MarketMakerConfig,
    venue: Arc<V>,
    status: StatusLine,
    results: Box<dyn Write + Send + Sync>,
    json: bool,
}

impl<V: Venue + ?Sized> MarketMaker<V> {
    /// Status line and cycle results both go to stdout.
    pub fn new(config: MarketMakerConfig, venue: Arc<V>) -> Self {
        Self {
            config,
            venue,
            status: StatusLine::stdout(),
            results: Box::new(io::stdout()),
            json: false,
        }
    }

    /// Emit cycle results as JSON lines. The status line is suppressed so
    /// stdout stays machine-readable.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        if json {
            self.status = StatusLine::sink();
        }
        self
    }

    pub fn with_output(mut self, status: StatusLine, results: impl Write + Send + Sync + 'static) -> Self {
        self.status = status;
        self.results = Box::new(results);
        self
    }

    /// One-off account checks before the first cycle.
    pub async fn start(&self) -> Result<(), MmError> {
        let symbol = self.config.symbol.as_str();

        self.venue
            .check_auth()
            .await
            .map_err(|e| MmError::Authentication(e.to_string()))?;

        match self.venue.set_cross_margin(symbol).await {
            Ok(()) => info!(symbol, "margin set to cross"),
            Err(e) if e.code() == Some(MARGIN_ALREADY_CROSS) => {
                info!(symbol, "margin is already set to cross")
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Run cycles until `cancel` is triggered or `max_cycles` is reached.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<SessionSummary, MmError> {
        self.config.validate()?;
        info!(
            venue = self.venue.venue_name(),
            symbol = %self.config.symbol,
            coin = %self.config.coin,
            capital_fraction = %self.config.capital_fraction,
            range = %self.config.range,
            depth = self.config.depth,
            polling_rate = self.config.polling_rate,
            take_profit = %self.config.take_profit_distance,
            stop = ?self.config.active_stop_distance(),
            "CONFIG"
        );

        self.start().await?;

        let mut summary = SessionSummary::default();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.config.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            summary.cycles += 1;

            match self.run_cycle(&cancel).await {
                Ok(LifecycleOutcome::Closed { result, protection }) => {
                    debug!(
                        resizes = protection.resizes,
                        take_profit = %protection.take_profit_price,
                        stop = ?protection.stop_price,
                        "protection at close"
                    );
                    summary.closed += 1;
                    summary.realized_pnl += result.closed_pnl;
                    write_cycle(&mut self.results, &result, self.json)?;
                }
                Ok(LifecycleOutcome::Reset) => summary.resets += 1,
                Ok(LifecycleOutcome::TimedOut) => summary.timeouts += 1,
                Ok(LifecycleOutcome::Cancelled) => break,
                Err(MmError::EmptyLadder { submitted }) => {
                    error!(submitted, "no ladder orders accepted, starting over");
                    summary.failed += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = time::sleep(self.config.poll_interval()) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }

        self.shutdown().await;
        info!(
            cycles = summary.cycles,
            closed = summary.closed,
            resets = summary.resets,
            timeouts = summary.timeouts,
            failed = summary.failed,
            pnl = %summary.realized_pnl,
            "SESSION"
        );
        Ok(summary)
    }

    async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<LifecycleOutcome, MmError> {
        let symbol = self.config.symbol.as_str();

        self.venue.cancel_all_orders(symbol).await?;
        self.venue.close_position(symbol).await?;

        let reference = self.venue.get_last_price(symbol).await?;
        let instrument = self.venue.get_instrument(symbol).await?;
        let balance = self.venue.get_available_balance(&self.config.coin).await?;

        let allocation = quote_allocation(
            instrument.contract,
            balance,
            reference,
            self.config.capital_fraction,
        );
        let (_, highest) = ladder_bounds(reference, self.config.range);
        let contracts = contracts_for_allocation(instrument.contract, allocation, highest);
        info!(
            reference = %reference,
            balance = %balance,
            allocation = %allocation,
            contracts = %contracts,
            tick = %instrument.tick_size,
            "CYCLE"
        );

        let ladder = LadderConfig {
            total_allocation: contracts,
            depth: self.config.depth,
            price_spread: self.config.range,
            reference_price: reference,
        };
        let tick = TickRule::new(instrument.tick_size, self.config.tick_rounding);
        let book = submit_ladder(&*self.venue, symbol, &ladder, &tick).await?;

        let mut lifecycle = PositionLifecycle::new(&*self.venue, &self.config, tick, reference);
        let outcome = lifecycle.run(book, &mut self.status, cancel).await;
        debug!(phase = ?lifecycle.phase(), "cycle finished");
        outcome
    }

    /// Pull resting orders on the way out. An open position keeps its
    /// take-profit venue-side until the next start flattens it.
    async fn shutdown(&mut self) {
        if let Err(e) = self.status.finish() {
            warn!(error = %e, "failed to finish status line");
        }
        info!("cancelling ladder orders...");
        let position_open = match self.venue.get_position(&self.config.symbol).await {
            Ok(p) => p.is_open(),
            Err(e) => {
                warn!(error = %e, "failed to read position on shutdown");
                true
            }
        };
        if position_open {
            warn!("position still open, leaving its orders in place");
            return;
        }
        if let Err(e) = self.venue.cancel_all_orders(&self.config.symbol).await {
            error!(error = %e, "failed to cancel orders on shutdown");
        }
    }
}
