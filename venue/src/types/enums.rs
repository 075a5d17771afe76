use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Side of an open position. The venue reports a flat position as `"None"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Buy,
    Sell,
    #[serde(rename = "None")]
    Flat,
}

impl PositionSide {
    /// The order side that opened this position, or `None` when flat.
    pub fn as_side(self) -> Option<Side> {
        match self {
            PositionSide::Buy => Some(Side::Buy),
            PositionSide::Sell => Some(Side::Sell),
            PositionSide::Flat => None,
        }
    }
}

impl From<Side> for PositionSide {
    fn from(s: Side) -> Self {
        match s {
            Side::Buy => PositionSide::Buy,
            Side::Sell => PositionSide::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    GoodTillCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Filled,
    Rejected,
}

impl OrderStatus {
    /// Whether the venue took the order (it may already have traded).
    pub fn is_accepted(self) -> bool {
        !matches!(self, OrderStatus::Rejected)
    }
}
