use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tick::Value;
use super::types::PairId;

/// Selects one of the four quote points of a candle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    Close,
    High,
    Low,
}

impl PriceField {
    pub const ALL: [Self; 4] = [Self::Open, Self::Close, Self::High, Self::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OHLC candle for one pair, with bid and ask for each point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub pair_id: PairId,
    /// Start of the candle interval
    pub time: DateTime<Utc>,
    pub open: Value,
    pub close: Value,
    pub high: Value,
    pub low: Value,
}

impl Rate {
    pub fn new(
        pair_id: PairId,
        time: DateTime<Utc>,
        open: Value,
        close: Value,
        high: Value,
        low: Value,
    ) -> Self {
        Self {
            pair_id,
            time,
            open,
            close,
            high,
            low,
        }
    }

    /// Quote at the selected point of the candle.
    pub fn value(&self, field: PriceField) -> Value {
        match field {
            PriceField::Open => self.open,
            PriceField::Close => self.close,
            PriceField::High => self.high,
            PriceField::Low => self.low,
        }
    }
}
