//! Provider connection settings read from the environment.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

pub const ENV_TOKEN: &str = "FXFEED_OANDA_TOKEN";
pub const ENV_ACCOUNT_ID: &str = "FXFEED_OANDA_ACCOUNT_ID";
pub const ENV_ENVIRONMENT: &str = "FXFEED_OANDA_ENVIRONMENT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "FXFEED_REQUEST_TIMEOUT_MS";
pub const ENV_REQUESTS_PER_MINUTE: &str = "FXFEED_REQUESTS_PER_MINUTE";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 120;

/// OANDA trading environment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OandaEnvironment {
    #[default]
    Practice,
    Live,
}

impl OandaEnvironment {
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Practice => "https://api-fxpractice.oanda.com",
            Self::Live => "https://api-fxtrade.oanda.com",
        }
    }

    fn parse(value: &str) -> Result<Self, MarketDataError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Self::Practice),
            "live" => Ok(Self::Live),
            other => Err(MarketDataError::Configuration(format!(
                "{} must be 'practice' or 'live', got '{}'",
                ENV_ENVIRONMENT, other
            ))),
        }
    }
}

/// Connection settings for [`crate::provider::OandaClient`].
#[derive(Clone, PartialEq)]
pub struct OandaConfig {
    pub token: String,
    pub account_id: String,
    pub environment: OandaEnvironment,
    pub request_timeout: Duration,
    pub requests_per_minute: u32,
}

impl OandaConfig {
    pub fn new(token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account_id: account_id.into(),
            environment: OandaEnvironment::default(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }

    pub fn with_environment(mut self, environment: OandaEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Load settings from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, MarketDataError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MarketDataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MarketDataError::Configuration(format!("{} is not set", key)))
        };

        let token = required(ENV_TOKEN)?;
        let account_id = required(ENV_ACCOUNT_ID)?;

        let environment = match lookup(ENV_ENVIRONMENT) {
            Some(value) if !value.trim().is_empty() => OandaEnvironment::parse(&value)?,
            _ => OandaEnvironment::default(),
        };

        let timeout_ms: u64 = parse_or(&lookup, ENV_REQUEST_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS)?;
        let requests_per_minute: u32 =
            parse_or(&lookup, ENV_REQUESTS_PER_MINUTE, DEFAULT_REQUESTS_PER_MINUTE)?;
        if requests_per_minute == 0 {
            return Err(MarketDataError::Configuration(format!(
                "{} must be positive",
                ENV_REQUESTS_PER_MINUTE
            )));
        }

        Ok(Self {
            token,
            account_id,
            environment,
            request_timeout: Duration::from_millis(timeout_ms),
            requests_per_minute,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, MarketDataError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            MarketDataError::Configuration(format!("{} is not a valid number: '{}'", key, raw))
        }),
        _ => Ok(default),
    }
}

// The token never reaches logs.
impl fmt::Debug for OandaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OandaConfig")
            .field("token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("environment", &self.environment)
            .field("request_timeout", &self.request_timeout)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}
