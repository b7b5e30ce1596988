use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Half-open retrieval window `[start, end)` in UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, MarketDataError> {
        if start > end {
            return Err(MarketDataError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }

    /// Number of `step` boundaries inside the window: `ceil((end - start) / step)`.
    pub fn grid_len(&self, step: Duration) -> usize {
        let step_ms = step.num_milliseconds();
        if step_ms <= 0 {
            return 0;
        }
        let span_ms = self.duration().num_milliseconds();
        ((span_ms + step_ms - 1) / step_ms) as usize
    }

    /// Boundaries `start, start + step, ...` strictly before `end`.
    pub fn grid(&self, step: Duration) -> impl Iterator<Item = DateTime<Utc>> {
        let start = self.start;
        (0..self.grid_len(step) as i32).map(move |i| start + step * i)
    }

    /// Split into consecutive sub-windows no longer than `max_span`.
    pub fn chunks(&self, max_span: Duration) -> Vec<TimeWindow> {
        if self.is_empty() || max_span <= Duration::zero() {
            return vec![*self];
        }
        let mut chunks = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            let next = cursor
                .checked_add_signed(max_span)
                .map_or(self.end, |t| t.min(self.end));
            chunks.push(TimeWindow {
                start: cursor,
                end: next,
            });
            cursor = next;
        }
        chunks
    }
}
