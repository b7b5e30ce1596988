//! Market data models
//!
//! This module contains the value objects produced by retrieval:
//! - `types` - Type aliases for identifiers (PairId, ProviderCode)
//! - `pair` - Tradable pair with trading metadata (Pair)
//! - `tick` - Bid/ask quotes at one instant (Value, Tick)
//! - `rate` - OHLC candles and the price field selector (Rate, PriceField)
//! - `granularity` - Internal interval taxonomy and provider codes (Granularity)
//! - `window` - Half-open retrieval window (TimeWindow)
//!
//! All models are immutable once constructed.

mod granularity;
mod pair;
mod rate;
mod tick;
mod types;
mod window;

pub use granularity::Granularity;
pub use pair::Pair;
pub use rate::{PriceField, Rate};
pub use tick::{Tick, Value};
pub use types::{PairId, ProviderCode};
pub use window::TimeWindow;
