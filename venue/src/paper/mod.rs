//! In-memory paper venue.
//!
//! Simulates one perpetual market for one account so the market maker can run
//! end to end without exchange connectivity. The price only moves when
//! [`PaperVenue::set_price`] is called, either by tests or by the
//! [`spawn_price_driver`] random walk.

mod engine;
mod state;
mod walk;

pub use engine::{PaperConfig, PaperVenue};
pub use state::RestingOrder;
pub use walk::{spawn_price_driver, PriceWalk};
