//! Market data provider abstraction and the OANDA implementation.
//!
//! This module contains:
//! - The `ProviderClient` trait the retrieval pipeline depends on
//! - Raw provider records, kept as delivered until conversion
//! - Per-endpoint request throttling
//! - The OANDA REST client
//!
//! Providers return raw records only. Mapping pair identifiers to provider
//! codes happens in the catalog, and normalization in the converter.

mod raw;
mod traits;

pub mod oanda;
pub mod rate_limiter;

pub use oanda::OandaClient;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use raw::{RawCandle, RawInstrument, RawNumber, RawPrice};
pub use traits::{PriceMode, ProviderClient, INSTRUMENT_FIELDS};
