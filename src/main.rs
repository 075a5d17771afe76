mod cli;
mod error;
mod mm;
mod orders;
mod output;
mod types;

#[cfg(test)]
mod testutil;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;
use venue::paper::spawn_price_driver;
use venue::{ContractKind, PaperConfig, PaperVenue, PriceWalk};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    match cli.command {
        Command::Run(args) => {
            let config = mm::config::MarketMakerConfig {
                symbol: args.symbol.to_uppercase(),
                coin: args.coin.to_uppercase(),
                capital_fraction: args.capital_fraction,
                range: args.range,
                depth: args.depth,
                polling_rate: args.polling_rate,
                take_profit_distance: args.take_profit_distance,
                stop_distance: Some(args.stop_distance),
                fill_timeout: args.fill_timeout_secs.map(Duration::from_secs),
                max_cycles: args.max_cycles,
                tick_rounding: args.tick_rounding,
            };

            let paper = args.paper;
            let contract = match paper.contract_size {
                Some(contract_size) => ContractKind::Linear { contract_size },
                None => ContractKind::Inverse,
            };
            let venue = Arc::new(PaperVenue::new(PaperConfig {
                symbol: config.symbol.clone(),
                coin: config.coin.clone(),
                tick_size: paper.tick_size,
                contract,
                initial_price: paper.initial_price,
                wallet_balance: paper.balance,
                max_open_orders: Some(paper.max_open_orders),
            }));
            info!(
                price = %paper.initial_price,
                balance = %paper.balance,
                contract = ?contract,
                seed = ?paper.seed,
                "paper venue ready"
            );

            let driver_cancel = cancel.child_token();
            let driver = spawn_price_driver(
                Arc::clone(&venue),
                PriceWalk::new(paper.volatility, paper.seed),
                Duration::from_millis(paper.walk_interval_ms),
                driver_cancel.clone(),
            );

            let mut maker = mm::cycle::MarketMaker::new(config, venue).with_json(args.json);
            let result = maker.run(cancel).await;

            driver_cancel.cancel();
            let _ = driver.await;

            if let Err(e) = result {
                tracing::error!(error = %e, "market maker fatal error");
                std::process::exit(1);
            }
        }

        Command::Preview(args) => {
            let ladder = types::LadderConfig {
                total_allocation: args.allocation,
                depth: args.depth,
                price_spread: args.range,
                reference_price: args.price,
            };
            let tick = mm::ladder::TickRule::new(args.tick_size, args.tick_rounding);

            let intents = match orders::ladder_intents(&args.symbol.to_uppercase(), &ladder, &tick) {
                Ok(intents) => intents,
                Err(e) => {
                    tracing::error!(error = %e, "invalid ladder");
                    std::process::exit(1);
                }
            };
            info!(orders = intents.len(), "ladder preview");
            if let Err(e) = output::write_intents(&mut std::io::stdout().lock(), &intents, args.json) {
                tracing::error!(error = %e, "failed to write ladder");
                std::process::exit(1);
            }
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register SIGTERM handler");
                    return;
                }
            };
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
