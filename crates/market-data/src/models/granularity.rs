use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Internal candle interval taxonomy.
///
/// Each member maps to exactly one provider granularity code, so the
/// mapping has no failure path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Tick granularity, the finest the provider offers for bid/ask candles.
    FifteenSeconds,
    OneMinute,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    SixHours,
    OneDay,
}

impl Granularity {
    /// Granularity used for tick history reconstruction.
    pub const FINEST: Self = Self::FifteenSeconds;

    /// All members, finest first.
    pub const ALL: [Self; 7] = [
        Self::FifteenSeconds,
        Self::OneMinute,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::SixHours,
        Self::OneDay,
    ];

    /// Provider granularity code.
    pub const fn provider_code(self) -> &'static str {
        match self {
            Self::FifteenSeconds => "S15",
            Self::OneMinute => "M1",
            Self::FifteenMinutes => "M15",
            Self::ThirtyMinutes => "M30",
            Self::OneHour => "H1",
            Self::SixHours => "H6",
            Self::OneDay => "D",
        }
    }

    pub const fn seconds(self) -> i64 {
        match self {
            Self::FifteenSeconds => 15,
            Self::OneMinute => 60,
            Self::FifteenMinutes => 15 * 60,
            Self::ThirtyMinutes => 30 * 60,
            Self::OneHour => 60 * 60,
            Self::SixHours => 6 * 60 * 60,
            Self::OneDay => 24 * 60 * 60,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// Finest granularity, no finer than `floor`, that covers `span` in at
    /// most `max_candles` candles. Falls back to [`Granularity::OneDay`].
    pub fn finest_fitting(span: Duration, max_candles: i64, floor: Self) -> Self {
        let span_secs = span.num_seconds().max(0);
        Self::ALL
            .into_iter()
            .filter(|g| *g >= floor)
            .find(|g| span_secs <= g.seconds().saturating_mul(max_candles.max(1)))
            .unwrap_or(Self::OneDay)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_code())
    }
}
