use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::mm::ladder::RoundMode;

/// ladder-mm: ladder market maker for a single perpetual market.
#[derive(Parser, Debug)]
#[command(name = "ladder-mm", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the market maker against the paper venue
    Run(RunArgs),

    /// Print the ladder that would be placed around a price
    Preview(PreviewArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Market symbol
    #[arg(long, default_value = "BTCUSD")]
    pub symbol: String,

    /// Coin whose balance funds the ladder
    #[arg(long, default_value = "BTC")]
    pub coin: String,

    /// Fraction of available balance deployed per side (20 = 20x)
    #[arg(long, default_value = "20")]
    pub capital_fraction: Decimal,

    /// Ladder width as a fraction of the last price (0.04 = ±2%)
    #[arg(long, default_value = "0.04")]
    pub range: Decimal,

    /// Orders per side
    #[arg(long, default_value = "20")]
    pub depth: usize,

    /// Position polls per second
    #[arg(long, default_value = "2")]
    pub polling_rate: f64,

    /// Take-profit distance as a fraction of the reference price
    #[arg(long, default_value = "0.003")]
    pub take_profit_distance: Decimal,

    /// Stop distance as a fraction of entry (0 disables the stop)
    #[arg(long, default_value = "0.025")]
    pub stop_distance: Decimal,

    /// Re-ladder when nothing fills within this many seconds
    #[arg(long)]
    pub fill_timeout_secs: Option<u64>,

    /// Stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Rounding onto the venue tick grid
    #[arg(long, value_enum, default_value_t = RoundMode::Floor)]
    pub tick_rounding: RoundMode,

    /// Output closed cycles as JSON instead of TSV
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub paper: PaperArgs,
}

/// Simulated market parameters.
#[derive(Args, Debug)]
pub struct PaperArgs {
    /// Starting price
    #[arg(long, default_value = "30000")]
    pub initial_price: Decimal,

    /// Starting wallet balance in the settlement coin
    #[arg(long, default_value = "1")]
    pub balance: Decimal,

    /// Price tick size
    #[arg(long, default_value = "0.5")]
    pub tick_size: Decimal,

    /// Linear contract size in base units (inverse contracts when omitted)
    #[arg(long)]
    pub contract_size: Option<Decimal>,

    /// Largest fractional price move per step
    #[arg(long, default_value = "0.0005")]
    pub volatility: f64,

    /// Price step interval (ms)
    #[arg(long, default_value = "250")]
    pub walk_interval_ms: u64,

    /// Seed for a reproducible price path
    #[arg(long)]
    pub seed: Option<u64>,

    /// Resting orders the venue accepts before rejecting
    #[arg(long, default_value = "500")]
    pub max_open_orders: usize,
}

/// Arguments for the `preview` subcommand.
#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Reference price
    pub price: Decimal,

    /// Contracts per side
    pub allocation: Decimal,

    #[arg(long, default_value = "BTCUSD")]
    pub symbol: String,

    #[arg(long, default_value = "20")]
    pub depth: usize,

    #[arg(long, default_value = "0.04")]
    pub range: Decimal,

    #[arg(long, default_value = "0.5")]
    pub tick_size: Decimal,

    #[arg(long, value_enum, default_value_t = RoundMode::Floor)]
    pub tick_rounding: RoundMode,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}
