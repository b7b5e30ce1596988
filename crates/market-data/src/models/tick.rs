use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::PairId;

/// Bid/ask quote for one pair at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub bid: f64,
    pub ask: f64,
}

impl Value {
    pub const fn new(bid: f64, ask: f64) -> Self {
        Self { bid, ask }
    }

    /// Ask minus bid.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Average of bid and ask.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// Quotes for one or more pairs at a single instant.
///
/// A current snapshot carries every pair in one tick; a reconstructed
/// history carries one pair per tick across many ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Quote per internal pair identifier
    pub values: HashMap<PairId, Value>,

    /// Instant of the quotes
    pub time: DateTime<Utc>,
}

impl Tick {
    pub fn new(values: HashMap<PairId, Value>, time: DateTime<Utc>) -> Self {
        Self { values, time }
    }

    /// Create a tick holding a single pair's quote.
    pub fn single(pair_id: PairId, value: Value, time: DateTime<Utc>) -> Self {
        let mut values = HashMap::with_capacity(1);
        values.insert(pair_id, value);
        Self { values, time }
    }

    /// Quote for a pair, if present in this tick.
    pub fn get(&self, pair_id: &str) -> Option<&Value> {
        self.values.get(pair_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
