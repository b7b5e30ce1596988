//! Tick history reconstruction.
//!
//! The provider only reports candles for intervals in which the pair
//! traded. [`HistoryReconstructor`] turns that sparse feed into one tick per
//! finest-granularity boundary of the requested window:
//!
//! ```text
//! grid:     T        T+15     T+30     T+45     T+60
//! candles:  [c1]              [c2]
//! ticks:    c1.open  c1.close c2.open  c2.close
//! ```
//!
//! A boundary with a candle takes that candle's opening quote. Every other
//! boundary carries forward the closing quote of the latest candle before
//! it. When the window does not start with a candle, the quote in effect
//! at the start is found by a bounded backward search.

mod seed;

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::catalog::InstrumentCatalog;
use crate::converter::to_value;
use crate::errors::{MarketDataError, RetrievalKind};
use crate::models::{Granularity, PairId, PriceField, ProviderCode, Tick, TimeWindow};
use crate::provider::{PriceMode, ProviderClient, RawCandle};

/// Candles the provider returns per request at most.
pub const MAX_CANDLES_PER_REQUEST: i64 = 5000;

/// Tuning for [`HistoryReconstructor`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionConfig {
    /// Grid step of the reconstructed series.
    pub granularity: Granularity,
    /// Range of the first backward seed search attempt.
    pub lookback_block: Duration,
    /// Furthest the seed search looks back before giving up.
    pub max_lookback: Duration,
    /// Candle limit of one provider request; longer ranges are split.
    pub max_candles_per_request: i64,
    /// Wall-clock budget for one call, covering every request it issues.
    pub timeout: Option<std::time::Duration>,
    /// Candle format requested from the provider. Midpoint candles yield
    /// ticks whose bid and ask are both the mid value.
    pub price_mode: PriceMode,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::FINEST,
            lookback_block: Duration::hours(12),
            max_lookback: Duration::days(1095),
            max_candles_per_request: MAX_CANDLES_PER_REQUEST,
            timeout: None,
            price_mode: PriceMode::BidAsk,
        }
    }
}

/// Per-call deadline, checked before and enforced during each request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub(crate) fn after(timeout: Option<std::time::Duration>) -> Self {
        Self {
            at: timeout.map(|t| Instant::now() + t),
        }
    }

    fn expired() -> MarketDataError {
        MarketDataError::retrieval(RetrievalKind::Connection, "deadline exceeded")
    }

    pub(crate) async fn run<T, F>(&self, request: F) -> Result<T, MarketDataError>
    where
        F: Future<Output = Result<T, MarketDataError>>,
    {
        let Some(at) = self.at else {
            return request.await;
        };
        if Instant::now() >= at {
            return Err(Self::expired());
        }
        tokio::time::timeout_at(at, request)
            .await
            .map_err(|_| Self::expired())?
    }
}

/// Fetch candles with `window.start() <= time < window.end()`, splitting the
/// window so that no request exceeds `max_candles` candles.
pub(crate) async fn fetch_range(
    client: &dyn ProviderClient,
    code: &ProviderCode,
    granularity: Granularity,
    window: TimeWindow,
    max_candles: i64,
    mode: PriceMode,
    deadline: &Deadline,
) -> Result<Vec<RawCandle>, MarketDataError> {
    let max_span = granularity.duration() * max_candles.clamp(1, i32::MAX as i64) as i32;
    let mut candles = Vec::new();

    for chunk in window.chunks(max_span) {
        if chunk.is_empty() {
            continue;
        }
        debug!(
            "Fetching {} candles for {}: [{}, {})",
            granularity,
            code,
            chunk.start(),
            chunk.end()
        );
        let batch = deadline
            .run(client.get_candles(code, granularity, chunk.start(), chunk.end(), mode))
            .await?;
        candles.extend(batch.into_iter().filter(|c| chunk.contains(c.time)));
    }

    Ok(candles)
}

/// Builds gap-free tick series for a single pair.
pub struct HistoryReconstructor {
    client: Arc<dyn ProviderClient>,
    catalog: Arc<InstrumentCatalog>,
    config: ReconstructionConfig,
}

impl HistoryReconstructor {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self::with_config(client, ReconstructionConfig::default())
    }

    pub fn with_config(client: Arc<dyn ProviderClient>, config: ReconstructionConfig) -> Self {
        Self {
            catalog: Arc::new(InstrumentCatalog::new(client.clone())),
            client,
            config,
        }
    }

    /// Resolve pair ids through `catalog`, so that pairs missing from its
    /// recorded listing are rejected.
    pub fn with_catalog(mut self, catalog: Arc<InstrumentCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct the tick series of `pair_id` over `window`.
    ///
    /// Returns exactly `window.grid_len(step)` ticks at `start + k * step`.
    /// An empty window returns no ticks without contacting the provider,
    /// once `pair_id` has resolved.
    pub async fn reconstruct(
        &self,
        pair_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Tick>, MarketDataError> {
        let code = self.catalog.resolve_provider_code(pair_id)?;
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let pair: PairId = Arc::from(pair_id);
        let step = self.config.granularity.duration();
        let deadline = Deadline::after(self.config.timeout);

        let candles = fetch_range(
            self.client.as_ref(),
            &code,
            self.config.granularity,
            window,
            self.config.max_candles_per_request,
            self.config.price_mode,
            &deadline,
        )
        .await?;

        let mut carry = match candles.first() {
            Some(first) if first.time == window.start() => to_value(first, PriceField::Open)?,
            _ => {
                seed::resolve_seed(
                    self.client.as_ref(),
                    pair_id,
                    &code,
                    window.start(),
                    &self.config,
                    &deadline,
                )
                .await?
            }
        };

        let mut ticks = Vec::with_capacity(window.grid_len(step));
        let mut pending = candles.iter().peekable();

        for time in window.grid(step) {
            let mut at_boundary = None;
            while let Some(candle) = pending.next_if(|c| c.time <= time) {
                if candle.time == time {
                    at_boundary = Some(to_value(candle, PriceField::Open)?);
                }
                carry = to_value(candle, PriceField::Close)?;
            }
            ticks.push(Tick::single(pair.clone(), at_boundary.unwrap_or(carry), time));
        }

        debug!(
            "Reconstructed {} ticks for {} from {} candles",
            ticks.len(),
            pair_id,
            candles.len()
        );
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use crate::provider::{RawInstrument, RawPrice};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    type Call = (Granularity, DateTime<Utc>, DateTime<Utc>);

    #[derive(Default)]
    struct ScriptedClient {
        candles: Vec<RawCandle>,
        calls: Mutex<Vec<Call>>,
        modes: Mutex<Vec<PriceMode>>,
        delay: Option<std::time::Duration>,
        failure: Option<RetrievalKind>,
    }

    impl ScriptedClient {
        fn with_candles(candles: Vec<RawCandle>) -> Arc<Self> {
            Arc::new(Self {
                candles,
                ..Self::default()
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedClient {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn list_instruments(
            &self,
            _: &[&str],
        ) -> Result<Vec<RawInstrument>, MarketDataError> {
            Ok(Vec::new())
        }

        async fn get_prices(&self, _: &[ProviderCode]) -> Result<Vec<RawPrice>, MarketDataError> {
            Ok(Vec::new())
        }

        async fn get_candles(
            &self,
            _: &ProviderCode,
            granularity: Granularity,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            mode: PriceMode,
        ) -> Result<Vec<RawCandle>, MarketDataError> {
            self.calls.lock().unwrap().push((granularity, start, end));
            self.modes.lock().unwrap().push(mode);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(kind) = self.failure {
                return Err(MarketDataError::retrieval(kind, "scripted failure"));
            }
            Ok(self
                .candles
                .iter()
                .filter(|c| c.time >= start && c.time < end)
                .cloned()
                .collect())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 10, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn window(from: i64, to: i64) -> TimeWindow {
        TimeWindow::new(at(from), at(to)).unwrap()
    }

    fn candle(secs: i64, open: (f64, f64), close: (f64, f64)) -> RawCandle {
        RawCandle::bid_ask(at(secs), open, close)
    }

    fn quotes(ticks: &[Tick]) -> Vec<(DateTime<Utc>, Value)> {
        ticks
            .iter()
            .map(|t| (t.time, *t.get("EURUSD").unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_single_candle_fills_window() {
        let client = ScriptedClient::with_candles(vec![candle(0, (1.1, 1.1002), (1.1, 1.1002))]);
        let reconstructor = HistoryReconstructor::new(client.clone());

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 45)).await.unwrap();

        let value = Value::new(1.1, 1.1002);
        assert_eq!(
            quotes(&ticks),
            vec![(at(0), value), (at(15), value), (at(30), value)]
        );
        // The candle at the start is the seed, so no backward search runs.
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_gaps_carry_previous_close() {
        let client = ScriptedClient::with_candles(vec![
            candle(0, (1.0, 1.1), (2.0, 2.1)),
            candle(30, (3.0, 3.1), (4.0, 4.1)),
        ]);
        let reconstructor = HistoryReconstructor::new(client);

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 60)).await.unwrap();

        assert_eq!(
            quotes(&ticks),
            vec![
                (at(0), Value::new(1.0, 1.1)),
                (at(15), Value::new(2.0, 2.1)),
                (at(30), Value::new(3.0, 3.1)),
                (at(45), Value::new(4.0, 4.1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_from_first_lookback_block() {
        let client = ScriptedClient::with_candles(vec![
            candle(-3 * 3600, (0.9, 0.91), (1.2, 1.2002)),
            candle(30, (1.3, 1.3002), (1.4, 1.4002)),
        ]);
        let reconstructor = HistoryReconstructor::new(client.clone());

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 45)).await.unwrap();

        assert_eq!(
            quotes(&ticks),
            vec![
                (at(0), Value::new(1.2, 1.2002)),
                (at(15), Value::new(1.2, 1.2002)),
                (at(30), Value::new(1.3, 1.3002)),
            ]
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            (Granularity::FifteenSeconds, at(-12 * 3600), at(0))
        );
    }

    #[tokio::test]
    async fn test_seed_search_extends_lookback() {
        let client = ScriptedClient::with_candles(vec![
            candle(-30 * 3600, (0.9, 0.91), (1.2, 1.2002)),
            candle(-20 * 3600, (0.8, 0.81), (1.5, 1.5002)),
        ]);
        let reconstructor = HistoryReconstructor::new(client.clone());

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 30)).await.unwrap();

        assert!(ticks.iter().all(|t| t.get("EURUSD") == Some(&Value::new(1.5, 1.5002))));

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1], (Granularity::FifteenSeconds, at(-12 * 3600), at(0)));
        assert_eq!(
            calls[2],
            (Granularity::FifteenSeconds, at(-24 * 3600), at(-12 * 3600))
        );
    }

    #[tokio::test]
    async fn test_wide_seed_attempts_use_coarser_granularity() {
        let client = ScriptedClient::with_candles(vec![candle(
            -40 * 3600,
            (0.9, 0.91),
            (1.2, 1.2002),
        )]);
        let reconstructor = HistoryReconstructor::new(client.clone());

        reconstructor.reconstruct("EURUSD", window(0, 15)).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[3],
            (Granularity::OneMinute, at(-48 * 3600), at(-24 * 3600))
        );
    }

    #[tokio::test]
    async fn test_no_data_is_bounded() {
        let client = ScriptedClient::with_candles(Vec::new());
        let config = ReconstructionConfig::default();
        let floor = at(0) - config.max_lookback;
        let reconstructor = HistoryReconstructor::with_config(client.clone(), config);

        let err = reconstructor
            .reconstruct("EURUSD", window(0, 45))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MarketDataError::NoDataAvailable { ref pair, lookback_hours: 26_280 } if pair == "EURUSD"
        ));

        let seed_calls = &client.calls()[1..];
        assert!(seed_calls.len() > 1);
        assert_eq!(seed_calls.len(), 13);
        assert!(seed_calls.iter().all(|(_, start, _)| *start >= floor));
        assert_eq!(seed_calls.last().unwrap().1, floor);
    }

    #[tokio::test]
    async fn test_custom_max_lookback() {
        let client = ScriptedClient::with_candles(Vec::new());
        let config = ReconstructionConfig {
            max_lookback: Duration::hours(36),
            ..ReconstructionConfig::default()
        };
        let reconstructor = HistoryReconstructor::with_config(client.clone(), config);

        let err = reconstructor.reconstruct("EURUSD", window(0, 15)).await.unwrap_err();
        assert!(matches!(
            err,
            MarketDataError::NoDataAvailable { lookback_hours: 36, .. }
        ));

        let ranges: Vec<_> = client.calls()[1..].iter().map(|c| (c.1, c.2)).collect();
        assert_eq!(
            ranges,
            vec![
                (at(-12 * 3600), at(0)),
                (at(-24 * 3600), at(-12 * 3600)),
                (at(-36 * 3600), at(-24 * 3600)),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_window_makes_no_requests() {
        let client = ScriptedClient::with_candles(Vec::new());
        let reconstructor = HistoryReconstructor::new(client.clone());

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 0)).await.unwrap();

        assert!(ticks.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_long_window_is_chunked() {
        let client = ScriptedClient::with_candles(vec![
            candle(0, (1.0, 1.1), (1.0, 1.1)),
            candle(75, (2.0, 2.1), (2.5, 2.6)),
        ]);
        let config = ReconstructionConfig {
            max_candles_per_request: 4,
            ..ReconstructionConfig::default()
        };
        let reconstructor = HistoryReconstructor::with_config(client.clone(), config);

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 120)).await.unwrap();

        assert_eq!(ticks.len(), 8);
        assert_eq!(ticks[5].get("EURUSD"), Some(&Value::new(2.0, 2.1)));
        assert_eq!(ticks[7].get("EURUSD"), Some(&Value::new(2.5, 2.6)));

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[0].1, calls[0].2), (at(0), at(60)));
        assert_eq!((calls[1].1, calls[1].2), (at(60), at(120)));
    }

    #[tokio::test]
    async fn test_off_grid_candle_feeds_next_boundary() {
        let client = ScriptedClient::with_candles(vec![
            candle(0, (1.0, 1.1), (1.0, 1.1)),
            candle(20, (2.0, 2.1), (3.0, 3.1)),
        ]);
        let reconstructor = HistoryReconstructor::new(client);

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 45)).await.unwrap();

        assert_eq!(
            quotes(&ticks),
            vec![
                (at(0), Value::new(1.0, 1.1)),
                (at(15), Value::new(1.0, 1.1)),
                (at(30), Value::new(3.0, 3.1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_last_step() {
        let client = ScriptedClient::with_candles(vec![candle(0, (1.0, 1.1), (1.0, 1.1))]);
        let reconstructor = HistoryReconstructor::new(client);

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 31)).await.unwrap();

        let times: Vec<_> = ticks.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![at(0), at(15), at(30)]);
    }

    #[tokio::test]
    async fn test_unknown_pair_makes_no_requests() {
        let client = ScriptedClient::with_candles(Vec::new());
        let reconstructor = HistoryReconstructor::new(client.clone());

        let err = reconstructor.reconstruct("EU", window(0, 15)).await.unwrap_err();

        assert!(matches!(err, MarketDataError::UnknownPair(_)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_still_resolves_pair() {
        let client = ScriptedClient::with_candles(Vec::new());
        let reconstructor = HistoryReconstructor::new(client.clone());

        let err = reconstructor.reconstruct("EU", window(0, 0)).await.unwrap_err();

        assert!(matches!(err, MarketDataError::UnknownPair(ref id) if id == "EU"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unlisted_pair_makes_no_requests() {
        let client = ScriptedClient::with_candles(vec![candle(0, (1.0, 1.1), (1.0, 1.1))]);
        let catalog = Arc::new(InstrumentCatalog::new(client.clone()));
        catalog.record_listing(&[Arc::from("EUR_USD")]);
        let reconstructor = HistoryReconstructor::new(client.clone()).with_catalog(catalog);

        let err = reconstructor.reconstruct("FOOBAR", window(0, 45)).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownPair(ref id) if id == "FOOBAR"));
        assert!(client.calls().is_empty());

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 45)).await.unwrap();
        assert_eq!(ticks.len(), 3);
    }

    #[tokio::test]
    async fn test_midpoint_mode_fills_both_sides() {
        let mut first = RawCandle::empty(at(0));
        first.open_mid = Some(1.1.into());
        first.close_mid = Some(1.2.into());
        let client = ScriptedClient::with_candles(vec![first]);
        let config = ReconstructionConfig {
            price_mode: PriceMode::Midpoint,
            ..ReconstructionConfig::default()
        };
        let reconstructor = HistoryReconstructor::with_config(client.clone(), config);

        let ticks = reconstructor.reconstruct("EURUSD", window(0, 30)).await.unwrap();

        assert_eq!(
            quotes(&ticks),
            vec![(at(0), Value::new(1.1, 1.1)), (at(15), Value::new(1.2, 1.2))]
        );
        assert_eq!(*client.modes.lock().unwrap(), vec![PriceMode::Midpoint]);
    }

    #[tokio::test]
    async fn test_retrieval_error_propagates() {
        let client = Arc::new(ScriptedClient {
            failure: Some(RetrievalKind::Overloaded),
            ..ScriptedClient::default()
        });
        let reconstructor = HistoryReconstructor::new(client);

        let err = reconstructor.reconstruct("EURUSD", window(0, 15)).await.unwrap_err();
        assert_eq!(err.retrieval_kind(), Some(RetrievalKind::Overloaded));
    }

    #[tokio::test]
    async fn test_deadline_aborts_slow_requests() {
        let client = Arc::new(ScriptedClient {
            delay: Some(std::time::Duration::from_millis(200)),
            ..ScriptedClient::default()
        });
        let config = ReconstructionConfig {
            timeout: Some(std::time::Duration::from_millis(20)),
            ..ReconstructionConfig::default()
        };
        let reconstructor = HistoryReconstructor::with_config(client.clone(), config);

        let err = reconstructor.reconstruct("EURUSD", window(0, 15)).await.unwrap_err();

        assert_eq!(err.retrieval_kind(), Some(RetrievalKind::Connection));
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_deadline_blocks_next_request() {
        let deadline = Deadline::after(Some(std::time::Duration::ZERO));
        let result: Result<(), _> = deadline.run(async { Ok(()) }).await;
        assert_eq!(
            result.unwrap_err().retrieval_kind(),
            Some(RetrievalKind::Connection)
        );

        let unbounded = Deadline::after(None);
        assert!(unbounded.run(async { Ok(1) }).await.is_ok());
    }
}
