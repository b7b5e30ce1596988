//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all retrieval operations
//! - [`RetrievalKind`]: Classification of transport and provider-status failures
//! - [`RetryClass`]: Hint for callers deciding whether to retry a failed call

mod retry;

pub use retry::RetryClass;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Classification of a failed provider call.
///
/// The core never interprets status codes beyond this classification;
/// callers decide how to react to each kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RetrievalKind {
    /// Network failure, timeout or exceeded deadline.
    Connection,
    /// The provider rejected the credentials (HTTP 401/403).
    Unauthorized,
    /// The provider is throttling or overloaded (HTTP 429/503).
    Overloaded,
    /// Any other provider failure.
    Unknown,
}

impl RetrievalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Unauthorized => "unauthorized",
            Self::Overloaded => "overloaded",
            Self::Unknown => "unknown",
        }
    }

    /// Classify an HTTP status code returned by the provider.
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            429 | 503 => Self::Overloaded,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RetrievalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while retrieving and normalizing market data.
///
/// All variants are surfaced to the caller unmodified. Nothing in this crate
/// substitutes a default value for missing or malformed provider data.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The pair identifier or provider code could not be resolved.
    #[error("Unknown pair: {0}")]
    UnknownPair(String),

    /// The provider payload was missing a field or carried a non-numeric value.
    #[error("Conversion failed for '{field}': {value}")]
    Conversion {
        /// Name of the offending provider field
        field: String,
        /// The raw value, or a description of what was wrong with it
        value: String,
    },

    /// A network, transport or provider-status failure.
    #[error("Retrieval failed ({kind}): {message}")]
    Retrieval {
        /// Failure classification
        kind: RetrievalKind,
        /// Detail from the transport or provider
        message: String,
    },

    /// The backward seed search exhausted its lookback without finding a candle.
    #[error("No data available for {pair} within {lookback_hours}h before the window start")]
    NoDataAvailable {
        /// Internal pair identifier
        pair: String,
        /// Maximum lookback that was searched, in hours
        lookback_hours: i64,
    },

    /// A time window whose start lies after its end.
    #[error("Invalid time window: start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MarketDataError {
    pub fn conversion(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conversion {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn retrieval(kind: RetrievalKind, message: impl Into<String>) -> Self {
        Self::Retrieval {
            kind,
            message: message.into(),
        }
    }

    /// Returns the retrieval kind for [`MarketDataError::Retrieval`] errors.
    pub fn retrieval_kind(&self) -> Option<RetrievalKind> {
        match self {
            Self::Retrieval { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// The crate itself never retries a failed request; this is a hint for
    /// callers that want to apply their own backoff.
    ///
    /// # Examples
    ///
    /// ```
    /// use fxfeed_market_data::errors::{MarketDataError, RetrievalKind, RetryClass};
    ///
    /// let error = MarketDataError::retrieval(RetrievalKind::Overloaded, "HTTP 429");
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::UnknownPair("XXXYYYZ".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Retrieval {
                kind: RetrievalKind::Overloaded | RetrievalKind::Connection,
                ..
            } => RetryClass::WithBackoff,

            Self::Retrieval {
                kind: RetrievalKind::Unauthorized | RetrievalKind::Unknown,
                ..
            }
            | Self::UnknownPair(_)
            | Self::Conversion { .. }
            | Self::NoDataAvailable { .. }
            | Self::InvalidWindow { .. }
            | Self::Configuration(_) => RetryClass::Never,
        }
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() || error.is_connect() || error.is_request() {
            RetrievalKind::Connection
        } else if let Some(status) = error.status() {
            RetrievalKind::from_status(status.as_u16())
        } else {
            RetrievalKind::Unknown
        };
        Self::retrieval(kind, error.to_string())
    }
}
