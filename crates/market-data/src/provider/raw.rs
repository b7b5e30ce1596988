//! Raw provider records.
//!
//! These mirror the provider's JSON payloads field by field. Numeric fields
//! may arrive either as JSON numbers or as numeric text, so they are kept as
//! [`RawNumber`] until the converter turns them into floats or integers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric field as delivered by the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Finite float value, or `None` when the text is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Integral value, or `None` when not a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        if let Self::Text(s) = self {
            if let Ok(value) = s.trim().parse::<i64>() {
                return Some(value);
            }
        }
        let value = self.as_f64()?;
        let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
        (value.fract() == 0.0 && in_range).then_some(value as i64)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Instrument entry from the instrument listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstrument {
    pub instrument: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pip: Option<RawNumber>,
    #[serde(default)]
    pub max_trade_units: Option<RawNumber>,
    #[serde(default)]
    pub precision: Option<RawNumber>,
    #[serde(default)]
    pub margin_rate: Option<RawNumber>,
}

/// Current price entry from a price snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPrice {
    pub instrument: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub bid: Option<RawNumber>,
    #[serde(default)]
    pub ask: Option<RawNumber>,
}

/// Candle in either bid/ask or midpoint format.
///
/// Bid/ask candles carry the `*_bid`/`*_ask` fields; midpoint candles
/// carry the `*_mid` fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandle {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub open_bid: Option<RawNumber>,
    #[serde(default)]
    pub open_ask: Option<RawNumber>,
    #[serde(default)]
    pub open_mid: Option<RawNumber>,
    #[serde(default)]
    pub high_bid: Option<RawNumber>,
    #[serde(default)]
    pub high_ask: Option<RawNumber>,
    #[serde(default)]
    pub high_mid: Option<RawNumber>,
    #[serde(default)]
    pub low_bid: Option<RawNumber>,
    #[serde(default)]
    pub low_ask: Option<RawNumber>,
    #[serde(default)]
    pub low_mid: Option<RawNumber>,
    #[serde(default)]
    pub close_bid: Option<RawNumber>,
    #[serde(default)]
    pub close_ask: Option<RawNumber>,
    #[serde(default)]
    pub close_mid: Option<RawNumber>,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub complete: Option<bool>,
}

impl RawCandle {
    /// Candle with no price fields set.
    pub fn empty(time: DateTime<Utc>) -> Self {
        Self {
            time,
            open_bid: None,
            open_ask: None,
            open_mid: None,
            high_bid: None,
            high_ask: None,
            high_mid: None,
            low_bid: None,
            low_ask: None,
            low_mid: None,
            close_bid: None,
            close_ask: None,
            close_mid: None,
            volume: None,
            complete: None,
        }
    }

    /// Bid/ask candle with the given open and close quotes; high and low
    /// are derived from them.
    pub fn bid_ask(time: DateTime<Utc>, open: (f64, f64), close: (f64, f64)) -> Self {
        Self {
            open_bid: Some(open.0.into()),
            open_ask: Some(open.1.into()),
            high_bid: Some(open.0.max(close.0).into()),
            high_ask: Some(open.1.max(close.1).into()),
            low_bid: Some(open.0.min(close.0).into()),
            low_ask: Some(open.1.min(close.1).into()),
            close_bid: Some(close.0.into()),
            close_ask: Some(close.1.into()),
            complete: Some(true),
            ..Self::empty(time)
        }
    }
}

/// Instrument listing envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct InstrumentsResponse {
    #[serde(default)]
    pub instruments: Vec<RawInstrument>,
}

/// Price snapshot envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct PricesResponse {
    #[serde(default)]
    pub prices: Vec<RawPrice>,
}

/// Candle listing envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<RawCandle>,
}
