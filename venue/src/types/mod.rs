pub mod enums;
pub mod instrument;
pub mod order;
pub mod pnl;
pub mod position;

pub use enums::*;
pub use instrument::*;
pub use order::*;
pub use pnl::*;
pub use position::*;
