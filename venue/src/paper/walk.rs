use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::*;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::engine::PaperVenue;

/// Bounded multiplicative random walk, snapped to the tick grid.
pub struct PriceWalk {
    rng: StdRng,
    /// Largest fractional move per step (0.001 = 10 bps).
    volatility: f64,
}

impl PriceWalk {
    /// A seeded walk is reproducible; without a seed it draws from entropy.
    pub fn new(volatility: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            volatility: volatility.abs(),
        }
    }

    pub fn next_price(&mut self, last: Decimal, tick: Decimal) -> Decimal {
        let step = self.rng.gen_range(-1.0..=1.0) * self.volatility;
        let factor = Decimal::from_f64(1.0 + step).unwrap_or(Decimal::ONE);
        let next = if tick > Decimal::ZERO {
            ((last * factor) / tick).round() * tick
        } else {
            last * factor
        };
        if next > Decimal::ZERO {
            next
        } else {
            last
        }
    }
}

/// Spawn a task that moves the paper market one walk step per `interval`
/// until `cancel` fires.
pub fn spawn_price_driver(
    venue: Arc<PaperVenue>,
    mut walk: PriceWalk,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tick = venue.tick_size();
        let mut interval = time::interval(interval);
        interval.tick().await; // consume immediate tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let next = walk.next_price(venue.last_price(), tick);
                    venue.set_price(next);
                    trace!(price = %next, "paper price");
                }
                _ = cancel.cancelled() => {
                    debug!("paper price driver stopped");
                    return;
                }
            }
        }
    })
}
