//! Provider client trait definitions.
//!
//! This module defines the `ProviderClient` trait the retrieval pipeline
//! depends on. Everything behind it (HTTP, authentication, throttling) is a
//! transport concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{Granularity, ProviderCode};

use super::raw::{RawCandle, RawInstrument, RawPrice};

/// Fields requested from the instrument listing.
pub const INSTRUMENT_FIELDS: &[&str] = &[
    "displayName",
    "pip",
    "maxTradeUnits",
    "precision",
    "marginRate",
];

/// Candle price format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PriceMode {
    /// Separate bid and ask values for each OHLC point.
    #[default]
    BidAsk,
    /// Midpoint values only.
    Midpoint,
}

impl PriceMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BidAsk => "bidask",
            Self::Midpoint => "midpoint",
        }
    }
}

/// Trait for market data provider clients.
///
/// Each call either returns the provider's raw records or fails with a
/// classified [`MarketDataError::Retrieval`]. Malformed payloads fail with
/// [`MarketDataError::Conversion`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fxfeed_market_data::provider::{ProviderClient, PriceMode, RawCandle, RawInstrument, RawPrice};
///
/// struct ReplayClient {
///     candles: Vec<RawCandle>,
/// }
///
/// #[async_trait]
/// impl ProviderClient for ReplayClient {
///     fn id(&self) -> &'static str {
///         "REPLAY"
///     }
///
///     // ... implement the three fetch methods
/// }
/// ```
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// List tradable instruments with the requested metadata fields.
    async fn list_instruments(
        &self,
        fields: &[&str],
    ) -> Result<Vec<RawInstrument>, MarketDataError>;

    /// Fetch the current price of each instrument.
    async fn get_prices(&self, codes: &[ProviderCode]) -> Result<Vec<RawPrice>, MarketDataError>;

    /// Fetch candles with `start <= time < end`, ordered by time ascending.
    async fn get_candles(
        &self,
        code: &ProviderCode,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: PriceMode,
    ) -> Result<Vec<RawCandle>, MarketDataError>;
}
