//! OANDA REST v1 provider client.
//!
//! Endpoints used:
//! - `/v1/instruments` for the tradable instrument list of an account
//! - `/v1/prices` for the current bid/ask snapshot
//! - `/v1/candles` for bid/ask or midpoint candles
//!
//! API documentation: http://developer.oanda.com/rest-live/rates/

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::OandaConfig;
use crate::errors::{MarketDataError, RetrievalKind};
use crate::models::{Granularity, ProviderCode};
use crate::provider::raw::{
    CandlesResponse, InstrumentsResponse, PricesResponse, RawCandle, RawInstrument, RawPrice,
};
use crate::provider::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::provider::traits::{PriceMode, ProviderClient};

const PROVIDER_ID: &str = "OANDA";

const INSTRUMENTS_ENDPOINT: &str = "/v1/instruments";
const PRICES_ENDPOINT: &str = "/v1/prices";
const CANDLES_ENDPOINT: &str = "/v1/candles";

/// OANDA REST client.
///
/// Every request carries the bearer token, is bounded by the configured
/// timeout, and is throttled per endpoint.
pub struct OandaClient {
    client: Client,
    base_url: String,
    token: String,
    account_id: String,
    rate_limiter: RateLimiter,
}

impl OandaClient {
    /// Create a client for the configured environment.
    pub fn new(config: &OandaConfig) -> Result<Self, MarketDataError> {
        Self::with_base_url(config, config.environment.base_url())
    }

    /// Create a client against an explicit base URL, e.g. a local stub server.
    pub fn with_base_url(
        config: &OandaConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                MarketDataError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let rate_limiter = RateLimiter::new(RateLimitConfig {
            requests_per_minute: config.requests_per_minute,
            ..RateLimitConfig::default()
        });

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: config.token.clone(),
            account_id: config.account_id.clone(),
            rate_limiter,
        })
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        }
    }

    /// GET an endpoint and decode its JSON body.
    ///
    /// Returns `None` for 204 No Content.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, MarketDataError> {
        let url = self.build_url(endpoint, params);

        self.rate_limiter.acquire(endpoint).await;
        debug!("OANDA request: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map(Some).map_err(|e| {
            MarketDataError::conversion(endpoint, format!("Failed to parse response: {}", e))
        })
    }

    fn candle_params(
        code: &ProviderCode,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: PriceMode,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("instrument", code.to_string()),
            ("granularity", granularity.provider_code().to_string()),
            ("candleFormat", mode.as_str().to_string()),
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("includeFirst", "true".to_string()),
        ]
    }
}

/// Map a non-success status to a classified retrieval error.
fn status_error(status: u16, body: &str) -> MarketDataError {
    let kind = RetrievalKind::from_status(status);
    let message = if body.is_empty() {
        format!("{} HTTP {}", PROVIDER_ID, status)
    } else {
        format!("{} HTTP {} - {}", PROVIDER_ID, status, body)
    };
    MarketDataError::retrieval(kind, message)
}

#[async_trait]
impl ProviderClient for OandaClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn list_instruments(
        &self,
        fields: &[&str],
    ) -> Result<Vec<RawInstrument>, MarketDataError> {
        let params = [
            ("accountId", self.account_id.clone()),
            ("fields", fields.join(",")),
        ];
        let response: Option<InstrumentsResponse> =
            self.fetch(INSTRUMENTS_ENDPOINT, &params).await?;
        Ok(response.map(|r| r.instruments).unwrap_or_default())
    }

    async fn get_prices(&self, codes: &[ProviderCode]) -> Result<Vec<RawPrice>, MarketDataError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let joined = codes.iter().map(|c| c.as_ref()).collect::<Vec<_>>().join(",");
        let response: Option<PricesResponse> =
            self.fetch(PRICES_ENDPOINT, &[("instruments", joined)]).await?;
        Ok(response.map(|r| r.prices).unwrap_or_default())
    }

    async fn get_candles(
        &self,
        code: &ProviderCode,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: PriceMode,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        if start >= end {
            return Ok(Vec::new());
        }
        let params = Self::candle_params(code, granularity, start, end, mode);
        let response: Option<CandlesResponse> = self.fetch(CANDLES_ENDPOINT, &params).await?;

        let mut candles = response.map(|r| r.candles).unwrap_or_default();
        // The provider treats `end` as inclusive.
        candles.retain(|c| c.time >= start && c.time < end);
        Ok(candles)
    }
}
