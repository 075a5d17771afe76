use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::Side;

/// Realized profit-and-loss of a position that has fully closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPnl {
    pub symbol: String,
    /// Side of the position that was closed.
    pub side: Side,
    /// Contracts closed over the life of the position.
    pub qty: u64,
    pub avg_entry_price: Decimal,
    pub avg_exit_price: Decimal,
    /// Realized PnL in the settlement currency.
    pub closed_pnl: Decimal,
    pub created_at: DateTime<Utc>,
}
