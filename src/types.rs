use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use venue::{ClosedPnl, OrderId, Side};

/// Inputs for one ladder. Immutable for the cycle it is built in.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderConfig {
    /// Contracts to spread over each side of the ladder.
    pub total_allocation: Decimal,
    /// Price levels per side.
    pub depth: usize,
    /// Width of the ladder as a fraction of the reference price.
    pub price_spread: Decimal,
    pub reference_price: Decimal,
}

/// Ids of the ladder orders still believed to be resting, by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub buy_order_ids: BTreeSet<OrderId>,
    pub sell_order_ids: BTreeSet<OrderId>,
}

impl OrderBook {
    pub fn insert(&mut self, side: Side, order_id: OrderId) {
        match side {
            Side::Buy => self.buy_order_ids.insert(order_id),
            Side::Sell => self.sell_order_ids.insert(order_id),
        };
    }

    /// Forget every id on `side`, returning them.
    pub fn take_side(&mut self, side: Side) -> Vec<OrderId> {
        let ids = match side {
            Side::Buy => std::mem::take(&mut self.buy_order_ids),
            Side::Sell => std::mem::take(&mut self.sell_order_ids),
        };
        ids.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.buy_order_ids.len() + self.sell_order_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Terminal record of a closed cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleResult {
    pub side: Side,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub closed_pnl: Decimal,
}

impl From<ClosedPnl> for CycleResult {
    fn from(p: ClosedPnl) -> Self {
        Self {
            side: p.side,
            quantity: p.qty,
            entry_price: p.avg_entry_price,
            exit_price: p.avg_exit_price,
            closed_pnl: p.closed_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_book_take_side_clears_only_that_side() {
        let mut book = OrderBook::default();
        book.insert(Side::Buy, "1".into());
        book.insert(Side::Buy, "2".into());
        book.insert(Side::Sell, "3".into());

        let taken = book.take_side(Side::Sell);
        assert_eq!(taken, vec![OrderId::from("3")]);
        assert!(book.sell_order_ids.is_empty());
        assert_eq!(book.buy_order_ids.len(), 2);
        assert_eq!(book.len(), 2);
    }
}
