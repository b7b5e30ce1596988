//! Instrument catalog.
//!
//! Maps internal pair identifiers to provider instrument codes and back,
//! and lists the tradable pairs with their trading metadata.
//!
//! Codes are formatted by rule. Once a listing has been seen, resolution
//! also requires the pair to be in it, so ids the provider does not trade
//! fail before any history request is made. Every
//! [`InstrumentCatalog::list_pairs`] call fetches afresh and replaces the
//! recorded listing; use [`ProviderCodeCache`] to memoize it for a session.

mod cache;
mod codes;

pub use cache::ProviderCodeCache;
pub use codes::{to_internal_id, to_provider_code};

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::converter;
use crate::errors::MarketDataError;
use crate::models::{Pair, PairId, ProviderCode};
use crate::provider::{ProviderClient, INSTRUMENT_FIELDS};

type Listing = Arc<HashSet<ProviderCode>>;

pub struct InstrumentCatalog {
    client: Arc<dyn ProviderClient>,
    listed: RwLock<Option<Listing>>,
}

impl InstrumentCatalog {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self {
            client,
            listed: RwLock::new(None),
        }
    }

    /// Fetch and convert the provider's instrument list.
    pub async fn list_pairs(&self) -> Result<Vec<Pair>, MarketDataError> {
        let instruments = self.client.list_instruments(INSTRUMENT_FIELDS).await?;
        debug!(
            "{} listed {} instruments",
            self.client.id(),
            instruments.len()
        );
        let pairs = instruments
            .iter()
            .map(converter::to_pair)
            .collect::<Result<Vec<_>, _>>()?;
        self.store(pairs.iter().map(|pair| pair.provider_code.clone()).collect());
        Ok(pairs)
    }

    /// Provider codes of every listed pair.
    pub async fn list_provider_codes(&self) -> Result<Vec<ProviderCode>, MarketDataError> {
        Ok(self
            .list_pairs()
            .await?
            .into_iter()
            .map(|pair| pair.provider_code)
            .collect())
    }

    /// Record a listing obtained elsewhere, e.g. from a shared
    /// [`ProviderCodeCache`].
    pub fn record_listing(&self, codes: &[ProviderCode]) {
        self.store(codes.iter().cloned().collect());
    }

    /// Whether a listing has been recorded.
    pub fn has_listing(&self) -> bool {
        self.listing().is_some()
    }

    pub fn resolve_provider_code(&self, internal_id: &str) -> Result<ProviderCode, MarketDataError> {
        let code = to_provider_code(internal_id)?;
        self.ensure_listed(&code, internal_id)?;
        Ok(code)
    }

    pub fn resolve_internal_id(&self, provider_code: &str) -> Result<PairId, MarketDataError> {
        let id = to_internal_id(provider_code)?;
        self.ensure_listed(provider_code, provider_code)?;
        Ok(id)
    }

    fn ensure_listed(&self, code: &str, requested: &str) -> Result<(), MarketDataError> {
        match self.listing() {
            Some(listed) if !listed.contains(code) => {
                Err(MarketDataError::UnknownPair(requested.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn store(&self, codes: HashSet<ProviderCode>) {
        let mut listed = self.listed.write().unwrap_or_else(|poisoned| {
            warn!("Catalog listing lock was poisoned, recovering");
            poisoned.into_inner()
        });
        *listed = Some(Arc::new(codes));
    }

    fn listing(&self) -> Option<Listing> {
        self.listed
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
