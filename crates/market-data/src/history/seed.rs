//! Backward search for the quote in effect just before a window starts.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::converter::to_value;
use crate::errors::MarketDataError;
use crate::models::{Granularity, PriceField, ProviderCode, Value};
use crate::provider::ProviderClient;

use super::{Deadline, ReconstructionConfig};

/// Find the closing quote of the latest candle before `start`.
///
/// Attempt `k` covers `[start - block * 2^k, start - block * 2^(k-1))`, so
/// each attempt doubles the total lookback and never re-queries a range.
/// The search stops at `config.max_lookback` and fails with
/// [`MarketDataError::NoDataAvailable`].
///
/// Wide ranges are queried at the finest granularity that fits in one
/// request. Only the latest close is used, and no finer candle exists in
/// the ranges already searched, so the result does not depend on the
/// granularity.
pub(crate) async fn resolve_seed(
    client: &dyn ProviderClient,
    pair_id: &str,
    code: &ProviderCode,
    start: DateTime<Utc>,
    config: &ReconstructionConfig,
    deadline: &Deadline,
) -> Result<Value, MarketDataError> {
    let max_lookback = config.max_lookback;
    let mut near = Duration::zero();
    let mut far = config.lookback_block.min(max_lookback);
    let mut attempt = 0;

    while far > near {
        let range_start = start - far;
        let range_end = start - near;
        let granularity =
            Granularity::finest_fitting(far - near, config.max_candles_per_request, config.granularity);

        debug!(
            "Seed search for {} attempt {}: [{}, {}) at {}",
            pair_id, attempt, range_start, range_end, granularity
        );

        let candles = deadline
            .run(client.get_candles(code, granularity, range_start, range_end, config.price_mode))
            .await?;

        if let Some(latest) = candles
            .iter()
            .rev()
            .find(|c| c.time >= range_start && c.time < range_end)
        {
            debug!("Seed for {} found at {}", pair_id, latest.time);
            return to_value(latest, PriceField::Close);
        }

        near = far;
        far = (far * 2).min(max_lookback);
        attempt += 1;
    }

    warn!(
        "No candle for {} within {}h before {} after {} attempts",
        pair_id,
        max_lookback.num_hours(),
        start,
        attempt
    );
    Err(MarketDataError::NoDataAvailable {
        pair: pair_id.to_string(),
        lookback_hours: max_lookback.num_hours(),
    })
}
