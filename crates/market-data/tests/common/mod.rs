//! Shared in-memory provider for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fxfeed_market_data::errors::MarketDataError;
use fxfeed_market_data::models::{Granularity, ProviderCode};
use fxfeed_market_data::provider::{
    PriceMode, ProviderClient, RawCandle, RawInstrument, RawNumber, RawPrice,
};

/// Start of every test scenario.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 6, 1, 10, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Provider serving a fixed set of records and counting requests.
#[derive(Default)]
pub struct ReplayClient {
    pub instruments: Vec<RawInstrument>,
    pub prices: Vec<RawPrice>,
    pub candles: Vec<RawCandle>,
    pub candle_requests: Mutex<Vec<(Granularity, DateTime<Utc>, DateTime<Utc>)>>,
    pub instrument_requests: AtomicUsize,
}

impl ReplayClient {
    pub fn with_candles(candles: Vec<RawCandle>) -> Self {
        Self {
            candles,
            ..Self::default()
        }
    }

    pub fn candle_request_count(&self) -> usize {
        self.candle_requests.lock().unwrap().len()
    }

    pub fn instrument_request_count(&self) -> usize {
        self.instrument_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ReplayClient {
    fn id(&self) -> &'static str {
        "REPLAY"
    }

    async fn list_instruments(
        &self,
        _fields: &[&str],
    ) -> Result<Vec<RawInstrument>, MarketDataError> {
        self.instrument_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.instruments.clone())
    }

    async fn get_prices(&self, codes: &[ProviderCode]) -> Result<Vec<RawPrice>, MarketDataError> {
        Ok(self
            .prices
            .iter()
            .filter(|p| codes.iter().any(|c| c.as_ref() == p.instrument))
            .cloned()
            .collect())
    }

    async fn get_candles(
        &self,
        _code: &ProviderCode,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _mode: PriceMode,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        self.candle_requests
            .lock()
            .unwrap()
            .push((granularity, start, end));
        Ok(self
            .candles
            .iter()
            .filter(|c| c.time >= start && c.time < end)
            .cloned()
            .collect())
    }
}

pub fn instrument(code: &str, precision: &str, margin_rate: &str) -> RawInstrument {
    RawInstrument {
        instrument: code.to_string(),
        display_name: None,
        pip: Some(RawNumber::from("0.0001")),
        max_trade_units: Some(RawNumber::from("10000000")),
        precision: Some(RawNumber::from(precision)),
        margin_rate: Some(RawNumber::from(margin_rate)),
    }
}

pub fn price(code: &str, time: DateTime<Utc>, bid: f64, ask: f64) -> RawPrice {
    RawPrice {
        instrument: code.to_string(),
        time,
        bid: Some(bid.into()),
        ask: Some(ask.into()),
    }
}
