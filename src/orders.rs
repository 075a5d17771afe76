//! Ladder order management: pair sizes with prices, submit as one batch,
//! and track the resting ids by side.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use venue::{OrderIntent, Side, Venue};

use crate::error::{ConfigError, MmError};
use crate::mm::ladder::{generate_prices, generate_quantities, TickRule};
use crate::types::{LadderConfig, OrderBook};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the ladder's order intents for `config`.
///
/// The generators own the input checks, so an invalid config fails here.
pub fn ladder_intents(
    symbol: &str,
    config: &LadderConfig,
    tick: &TickRule,
) -> Result<Vec<OrderIntent>, ConfigError> {
    let quantities = generate_quantities(config.total_allocation, config.depth)?;
    let prices = generate_prices(config.reference_price, config.price_spread, config.depth)?;
    Ok(build_intents(symbol, &quantities, &prices, tick))
}

/// Submit the ladder as a single batch and return the accepted ids by side.
///
/// Rejected entries are logged and dropped. A batch with no accepted order
/// fails the cycle with [`MmError::EmptyLadder`].
pub async fn submit_ladder<V: Venue + ?Sized>(
    venue: &V,
    symbol: &str,
    config: &LadderConfig,
    tick: &TickRule,
) -> Result<OrderBook, MmError> {
    let intents = ladder_intents(symbol, config, tick)?;
    if intents.is_empty() {
        return Err(MmError::EmptyLadder { submitted: 0 });
    }

    debug!(orders = format_intents(&intents), "submitting ladder");
    let acks = venue.place_orders_batch(&intents).await?;

    let mut book = OrderBook::default();
    let mut rejected = 0usize;
    for ack in acks {
        if ack.status.is_accepted() {
            book.insert(ack.side, ack.order_id);
        } else {
            rejected += 1;
            warn!(
                order_id = %ack.order_id,
                side = %ack.side,
                reason = ack.reject_reason.as_deref().unwrap_or("unknown"),
                "order rejected"
            );
        }
    }

    if book.is_empty() {
        return Err(MmError::EmptyLadder {
            submitted: intents.len(),
        });
    }
    if rejected > 0 {
        warn!(rejected, accepted = book.len(), "ladder partially placed");
    }

    info!(
        reference = %config.reference_price,
        buys = book.buy_order_ids.len(),
        sells = book.sell_order_ids.len(),
        "LADDER"
    );
    Ok(book)
}

/// Cancel every tracked order on `side` and forget the ids.
pub async fn cancel_side<V: Venue + ?Sized>(
    venue: &V,
    symbol: &str,
    book: &mut OrderBook,
    side: Side,
) -> Result<usize, MmError> {
    let ids = book.take_side(side);
    if ids.is_empty() {
        return Ok(0);
    }
    venue.cancel_orders_batch(symbol, &ids).await?;
    info!(side = %side, count = ids.len(), "CANCEL");
    Ok(ids.len())
}

// ---------------------------------------------------------------------------
// Pure pairing logic
// ---------------------------------------------------------------------------

/// Pair signed sizes with prices index-wise. Zero sizes are skipped.
pub fn build_intents(
    symbol: &str,
    quantities: &[i64],
    prices: &[Decimal],
    tick: &TickRule,
) -> Vec<OrderIntent> {
    quantities
        .iter()
        .zip(prices)
        .filter(|(q, _)| **q != 0)
        .map(|(&q, &price)| {
            let side = if q > 0 { Side::Buy } else { Side::Sell };
            OrderIntent::limit(symbol, side, q.unsigned_abs(), tick.align(price))
        })
        .collect()
}

/// Format intents for logging, e.g. `B@99x10 S@101x10`.
pub fn format_intents(intents: &[OrderIntent]) -> String {
    intents
        .iter()
        .map(|o| {
            let s = match o.side {
                Side::Buy => "B",
                Side::Sell => "S",
            };
            let ro = if o.reduce_only { "RO" } else { "" };
            format!("{s}{ro}@{}x{}", o.price, o.qty)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::ladder::RoundMode;
    use crate::testutil::{Call, MockVenue};
    use rust_decimal_macros::dec;
    use venue::OrderId;

    fn tick() -> TickRule {
        TickRule::new(dec!(1), RoundMode::Floor)
    }

    fn ladder() -> LadderConfig {
        LadderConfig {
            total_allocation: dec!(30),
            depth: 5,
            price_spread: dec!(0.04),
            reference_price: dec!(100),
        }
    }

    #[test]
    fn test_pairing_signs_become_sides() {
        let tick = TickRule::new(dec!(0.5), RoundMode::Floor);
        let intents = build_intents(
            "BTCUSD",
            &[3, 1, -1, -3],
            &[dec!(98), dec!(99.7), dec!(100.3), dec!(102)],
            &tick,
        );
        let summary: Vec<_> = intents.iter().map(|o| (o.side, o.qty, o.price)).collect();
        assert_eq!(
            summary,
            vec![
                (Side::Buy, 3, dec!(98)),
                (Side::Buy, 1, dec!(99.5)),
                (Side::Sell, 1, dec!(100)),
                (Side::Sell, 3, dec!(102)),
            ]
        );
        assert!(intents.iter().all(|o| !o.reduce_only));
    }

    #[test]
    fn test_zero_sizes_skipped() {
        let tick = tick();
        let intents = build_intents("BTCUSD", &[1, 0, 0, -1], &[dec!(98), dec!(99), dec!(101), dec!(102)], &tick);
        assert_eq!(intents.len(), 2);
    }

    #[test]
    fn test_ladder_intents_largest_orders_outermost() {
        let intents = ladder_intents("BTCUSD", &ladder(), &tick()).unwrap();
        assert_eq!(intents.len(), 10);
        assert_eq!((intents[0].side, intents[0].qty, intents[0].price), (Side::Buy, 10, dec!(98)));
        assert_eq!((intents[9].side, intents[9].qty, intents[9].price), (Side::Sell, 10, dec!(102)));
        assert!(intents.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn test_ladder_intents_report_the_offending_field() {
        let zero_depth = LadderConfig { depth: 0, ..ladder() };
        assert_eq!(
            ladder_intents("BTCUSD", &zero_depth, &tick()),
            Err(ConfigError::invalid("depth", "must be at least 1"))
        );

        let flat_spread = LadderConfig {
            price_spread: Decimal::ZERO,
            ..ladder()
        };
        assert_eq!(
            ladder_intents("BTCUSD", &flat_spread, &tick()),
            Err(ConfigError::invalid("price_spread", "must be positive"))
        );

        let no_allocation = LadderConfig {
            total_allocation: Decimal::ZERO,
            ..ladder()
        };
        assert_eq!(
            ladder_intents("BTCUSD", &no_allocation, &tick()),
            Err(ConfigError::invalid("total_allocation", "must be positive"))
        );
    }

    #[test]
    fn test_format_intents() {
        let mut tp = OrderIntent::limit("BTCUSD", Side::Sell, 5, dec!(101));
        tp.reduce_only = true;
        let s = format_intents(&[OrderIntent::limit("BTCUSD", Side::Buy, 10, dec!(99)), tp]);
        assert_eq!(s, "B@99x10 SRO@101x5");
    }

    #[tokio::test]
    async fn test_submit_partitions_by_side() {
        let venue = MockVenue::new();
        let book = submit_ladder(&venue, "BTCUSD", &ladder(), &tick())
            .await
            .unwrap();
        assert_eq!(book.buy_order_ids.len(), 5);
        assert_eq!(book.sell_order_ids.len(), 5);
        assert!(book.buy_order_ids.iter().all(|id| id.as_str().starts_with("Buy")));
        assert!(book.sell_order_ids.iter().all(|id| id.as_str().starts_with("Sell")));

        let batches = venue
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::PlaceBatch(_)))
            .count();
        assert_eq!(batches, 1);
    }

    #[tokio::test]
    async fn test_partial_rejection_keeps_accepted_subset() {
        let venue = MockVenue::new().rejecting([0, 9]);
        let book = submit_ladder(&venue, "BTCUSD", &ladder(), &tick())
            .await
            .unwrap();
        assert_eq!(book.len(), 8);
        assert!(!book.buy_order_ids.contains(&OrderId::from("Buy-98-10")));
        assert!(!book.sell_order_ids.contains(&OrderId::from("Sell-102-10")));
    }

    #[tokio::test]
    async fn test_fully_rejected_batch_is_fatal() {
        let venue = MockVenue::new().rejecting(0..10);
        let err = submit_ladder(&venue, "BTCUSD", &ladder(), &tick())
            .await
            .unwrap_err();
        assert!(matches!(err, MmError::EmptyLadder { submitted: 10 }));
    }

    #[tokio::test]
    async fn test_invalid_ladder_never_reaches_venue() {
        let venue = MockVenue::new();
        let cfg = LadderConfig { depth: 0, ..ladder() };
        let err = submit_ladder(&venue, "BTCUSD", &cfg, &tick())
            .await
            .unwrap_err();
        assert!(matches!(err, MmError::Config(_)));
        assert!(venue.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_twice_is_idempotent_against_echo() {
        let venue = MockVenue::new();
        let tick = tick();
        let first = submit_ladder(&venue, "BTCUSD", &ladder(), &tick).await.unwrap();
        let second = submit_ladder(&venue, "BTCUSD", &ladder(), &tick).await.unwrap();
        assert_eq!(first, second);

        let batches: Vec<_> = venue
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::PlaceBatch(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], batches[1]);
    }

    #[tokio::test]
    async fn test_cancel_side_clears_and_calls_once() {
        let venue = MockVenue::new();
        let mut book = submit_ladder(&venue, "BTCUSD", &ladder(), &tick())
            .await
            .unwrap();
        let sells: Vec<OrderId> = book.sell_order_ids.iter().cloned().collect();

        assert_eq!(cancel_side(&venue, "BTCUSD", &mut book, Side::Sell).await.unwrap(), 5);
        assert!(book.sell_order_ids.is_empty());
        assert_eq!(book.buy_order_ids.len(), 5);
        assert_eq!(venue.calls().last(), Some(&Call::CancelBatch(sells)));

        // Nothing left to cancel: no venue call.
        let before = venue.calls().len();
        assert_eq!(cancel_side(&venue, "BTCUSD", &mut book, Side::Sell).await.unwrap(), 0);
        assert_eq!(venue.calls().len(), before);
    }
}
