//! FX Feed Market Data Crate
//!
//! This crate retrieves quotes for currency pairs and other tradable
//! instruments from a remote provider and normalizes them into an internal
//! model usable by trading logic.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Listing tradable pairs with their trading metadata
//! - Cross-sectional snapshots of the current bid/ask of every pair
//! - Gap-free tick histories at the finest granularity
//! - OHLC rate histories at any supported granularity
//!
//! # Architecture
//!
//! ```text
//! +---------------------+
//! | MarketDataRetriever |  (orchestration)
//! +---------------------+
//!      |            |
//!      v            v
//! +----------+  +----------------------+
//! | Catalog  |  | HistoryReconstructor |  (pair codes / densification)
//! +----------+  +----------------------+
//!      |            |
//!      v            v
//! +---------------------+
//! |   ProviderClient    |  (OANDA REST, throttled)
//! +---------------------+
//!           |
//!           v
//! +---------------------+
//! |     Converter       |  (raw records -> Pair / Tick / Rate)
//! +---------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Pair`] - Tradable pair with pip size, precision and margin rate
//! - [`Tick`] - Bid/ask quotes of one or more pairs at one instant
//! - [`Rate`] - OHLC candle with bid/ask per point
//! - [`TimeWindow`] - Half-open retrieval window
//! - [`Granularity`] - Candle interval taxonomy
//!
//! # Type Aliases
//!
//! - [`PairId`] - Internal pair identifier (e.g., "EURUSD")
//! - [`ProviderCode`] - Provider instrument code (e.g., "EUR_USD")

pub mod catalog;
pub mod config;
pub mod converter;
pub mod errors;
pub mod history;
pub mod models;
pub mod provider;
pub mod retriever;

// Re-export all public types from models
pub use models::{
    Granularity, Pair, PairId, PriceField, ProviderCode, Rate, Tick, TimeWindow, Value,
};

pub use catalog::{InstrumentCatalog, ProviderCodeCache};
pub use config::{OandaConfig, OandaEnvironment};
pub use errors::{MarketDataError, RetrievalKind, RetryClass};
pub use history::{HistoryReconstructor, ReconstructionConfig};
pub use provider::{OandaClient, PriceMode, ProviderClient};
pub use retriever::MarketDataRetriever;
