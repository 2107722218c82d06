//! Domain types: prices, fundamentals, parameters, positions, trades.

pub mod fundamentals;
pub mod params;
pub mod position;
pub mod price;
pub mod trade;

pub use fundamentals::FundamentalSnapshot;
pub use params::{ParamError, StrategyParameters};
pub use position::{Direction, OpenPosition};
pub use price::PriceRow;
pub use trade::{ClosedTrade, ExitReason};
