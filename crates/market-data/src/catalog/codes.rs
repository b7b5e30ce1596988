//! Rule-based mapping between internal pair identifiers and provider codes.
//!
//! The provider separates the quote currency with an underscore:
//!
//! | Internal id | Provider code |
//! |-------------|---------------|
//! | EURUSD      | EUR_USD       |
//! | USDJPY      | USD_JPY       |
//! | SPX500USD   | SPX500_USD    |
//!
//! The quote currency is always the last three characters.

use std::sync::Arc;

use crate::errors::MarketDataError;
use crate::models::{PairId, ProviderCode};

const QUOTE_LEN: usize = 3;

fn is_code_part(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Convert an internal pair identifier to the provider instrument code.
pub fn to_provider_code(internal_id: &str) -> Result<ProviderCode, MarketDataError> {
    if internal_id.len() <= QUOTE_LEN || !is_code_part(internal_id) {
        return Err(MarketDataError::UnknownPair(internal_id.to_string()));
    }
    let (base, quote) = internal_id.split_at(internal_id.len() - QUOTE_LEN);
    Ok(Arc::from(format!("{}_{}", base, quote)))
}

/// Convert a provider instrument code to the internal pair identifier.
pub fn to_internal_id(provider_code: &str) -> Result<PairId, MarketDataError> {
    match provider_code.split_once('_') {
        Some((base, quote))
            if is_code_part(base) && is_code_part(quote) && quote.len() == QUOTE_LEN =>
        {
            Ok(Arc::from(format!("{}{}", base, quote)))
        }
        _ => Err(MarketDataError::UnknownPair(provider_code.to_string())),
    }
}
