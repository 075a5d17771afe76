//! Market maker configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ConfigError;
use crate::mm::ladder::RoundMode;

/// Longest allowed sleep between position polls.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// All tuneable parameters for the ladder market maker.
///
/// Use [`Default::default()`] for the stock settings, then override what the
/// command line provides. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct MarketMakerConfig {
    /// Market symbol (e.g. "BTCUSD").
    pub symbol: String,
    /// Coin whose available balance funds the ladder (e.g. "BTC").
    pub coin: String,
    /// Fraction of available balance deployed per ladder side
    /// (1 = 100%, 20 = 20x).
    pub capital_fraction: Decimal,
    /// Ladder width as a fraction of the last price (0.04 = ±2%).
    pub range: Decimal,
    /// Orders on each side of the ladder.
    pub depth: usize,
    /// Position polls per second.
    pub polling_rate: f64,
    /// Take-profit distance as a fraction of the cycle's reference price.
    pub take_profit_distance: Decimal,
    /// Stop distance as a fraction of entry. `None` or zero disables the stop.
    pub stop_distance: Option<Decimal>,
    /// Give up on an unfilled ladder after this long and lay a fresh one.
    pub fill_timeout: Option<Duration>,
    /// Stop after this many cycles.
    pub max_cycles: Option<u64>,
    /// How ladder and protective prices snap to the tick grid.
    pub tick_rounding: RoundMode,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSD".into(),
            coin: "BTC".into(),
            capital_fraction: dec!(20),
            range: dec!(0.04),
            depth: 20,
            polling_rate: 2.0,
            take_profit_distance: dec!(0.003),
            stop_distance: Some(dec!(0.025)),
            fill_timeout: None,
            max_cycles: None,
            tick_rounding: RoundMode::Floor,
        }
    }
}

impl MarketMakerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::invalid("symbol", "must not be empty"));
        }
        if self.coin.is_empty() {
            return Err(ConfigError::invalid("coin", "must not be empty"));
        }
        if self.capital_fraction <= Decimal::ZERO {
            return Err(ConfigError::invalid("capital_fraction", "must be positive"));
        }
        if self.range <= Decimal::ZERO || self.range >= dec!(2) {
            return Err(ConfigError::invalid("range", "must be in (0, 2)"));
        }
        if self.depth == 0 {
            return Err(ConfigError::invalid("depth", "must be at least 1"));
        }
        if !self.polling_rate.is_finite() || self.polling_rate <= 0.0 {
            return Err(ConfigError::invalid("polling_rate", "must be positive"));
        }
        match Duration::try_from_secs_f64(1.0 / self.polling_rate) {
            Ok(interval) if interval <= MAX_POLL_INTERVAL => {}
            _ => {
                return Err(ConfigError::invalid(
                    "polling_rate",
                    "must be at least one poll per hour",
                ))
            }
        }
        if self.take_profit_distance < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "take_profit_distance",
                "must not be negative",
            ));
        }
        if let Some(stop) = self.stop_distance {
            if stop < Decimal::ZERO || stop >= Decimal::ONE {
                return Err(ConfigError::invalid("stop_distance", "must be in [0, 1)"));
            }
        }
        Ok(())
    }

    /// Sleep between position polls (`1 / polling_rate` seconds), capped at
    /// [`MAX_POLL_INTERVAL`].
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.polling_rate)
            .map_or(MAX_POLL_INTERVAL, |d| d.min(MAX_POLL_INTERVAL))
    }

    /// The configured stop distance, if it actually enables a stop.
    pub fn active_stop_distance(&self) -> Option<Decimal> {
        self.stop_distance.filter(|d| !d.is_zero())
    }
}
