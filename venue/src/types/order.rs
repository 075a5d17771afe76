use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{OrderStatus, Side, TimeInForce};

/// Venue-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A limit order to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub qty: u64,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
}

impl OrderIntent {
    /// Good-till-cancel limit order that may open a position.
    pub fn limit(symbol: &str, side: Side, qty: u64, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            qty,
            price,
            time_in_force: TimeInForce::GoodTillCancel,
            reduce_only: false,
        }
    }
}

/// Per-order result of a batch placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: OrderId,
    pub side: Side,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
}
