use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::PositionSide;

/// Snapshot of the account's position in one market.
///
/// `side == Flat` exactly when `size == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    /// Size in contracts.
    pub size: u64,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
    /// Effective leverage of the position against wallet balance.
    pub leverage: Decimal,
    pub wallet_balance: Decimal,
}

impl Position {
    pub fn flat(symbol: &str, wallet_balance: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: PositionSide::Flat,
            size: 0,
            entry_price: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            leverage: Decimal::ZERO,
            wallet_balance,
        }
    }

    pub fn is_open(&self) -> bool {
        self.size != 0
    }

    /// Size with sign by side (negative when short).
    pub fn signed_size(&self) -> i64 {
        let size = self.size as i64;
        match self.side {
            PositionSide::Sell => -size,
            _ => size,
        }
    }
}
