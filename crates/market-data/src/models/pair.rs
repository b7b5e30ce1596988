use serde::{Deserialize, Serialize};

use super::types::{PairId, ProviderCode};

/// Tradable pair with its trading metadata.
///
/// Identified uniquely by `internal_id`; other values refer to a pair by
/// `internal_id` or `provider_code` rather than owning it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// Internal identifier (e.g. "EURUSD")
    pub internal_id: PairId,

    /// Provider instrument code (e.g. "EUR_USD")
    pub provider_code: ProviderCode,

    /// Size of one pip
    pub pip: f64,

    /// Maximum units allowed in a single trade
    pub max_trade_units: i64,

    /// Smallest quoted price increment
    pub precision: f64,

    /// Margin requirement as a fraction of notional
    pub margin_rate: f64,
}

impl Pair {
    pub fn new(
        internal_id: PairId,
        provider_code: ProviderCode,
        pip: f64,
        max_trade_units: i64,
        precision: f64,
        margin_rate: f64,
    ) -> Self {
        Self {
            internal_id,
            provider_code,
            pip,
            max_trade_units,
            precision,
            margin_rate,
        }
    }
}
