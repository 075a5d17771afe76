use thiserror::Error;

use crate::types::OrderId;

/// Rejection code returned by `set_cross_margin` when the account is already
/// on cross margin. Callers treat it as success.
pub const MARGIN_ALREADY_CROSS: i64 = 34015;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("unknown coin: {0}")]
    UnknownCoin(String),

    #[error("no closed PnL record for {0}")]
    NoClosedPnl(String),
}

impl VenueError {
    pub fn rejected(code: i64, message: impl Into<String>) -> Self {
        VenueError::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Venue rejection code, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            VenueError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VenueError>;
