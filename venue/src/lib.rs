pub mod error;
pub mod exchange;
pub mod paper;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

pub use error::{Result, VenueError, MARGIN_ALREADY_CROSS};
pub use exchange::Venue;

// Core enums
pub use types::{OrderStatus, PositionSide, Side, TimeInForce};

// Orders
pub use types::{OrderAck, OrderId, OrderIntent};

// Account state
pub use types::{ClosedPnl, Position};

// Instrument
pub use types::{ContractKind, InstrumentInfo};

// Paper trading
pub use paper::{PaperConfig, PaperVenue, PriceWalk};
