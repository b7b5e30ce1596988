//! Public entry point of the crate.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{InstrumentCatalog, ProviderCodeCache};
use crate::converter;
use crate::errors::MarketDataError;
use crate::history::{fetch_range, Deadline, HistoryReconstructor, ReconstructionConfig};
use crate::models::{Granularity, Pair, PairId, ProviderCode, Rate, Tick, TimeWindow};
use crate::provider::ProviderClient;

/// Retrieves pairs, current quotes and histories from one provider.
///
/// Each operation issues its requests sequentially. Independent operations
/// may run concurrently on a shared retriever; the shared state is the
/// catalog's latest listing and the optional [`ProviderCodeCache`].
///
/// History operations reject pair ids missing from the latest listing
/// before requesting any candles. With a code cache the listing is loaded
/// on first use; without one it comes from the last
/// [`retrieve_pairs`](Self::retrieve_pairs) or
/// [`retrieve_current_tick`](Self::retrieve_current_tick) call.
///
/// # Example
///
/// ```ignore
/// let config = OandaConfig::from_env()?;
/// let client = Arc::new(OandaClient::new(&config)?);
/// let retriever = MarketDataRetriever::new(client)
///     .with_code_cache(Arc::new(ProviderCodeCache::new()));
///
/// let tick = retriever.retrieve_current_tick().await?;
/// ```
pub struct MarketDataRetriever {
    client: Arc<dyn ProviderClient>,
    catalog: Arc<InstrumentCatalog>,
    history: HistoryReconstructor,
    code_cache: Option<Arc<ProviderCodeCache>>,
}

impl MarketDataRetriever {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self::with_config(client, ReconstructionConfig::default())
    }

    pub fn with_config(client: Arc<dyn ProviderClient>, config: ReconstructionConfig) -> Self {
        let catalog = Arc::new(InstrumentCatalog::new(client.clone()));
        Self {
            history: HistoryReconstructor::with_config(client.clone(), config)
                .with_catalog(catalog.clone()),
            catalog,
            client,
            code_cache: None,
        }
    }

    /// Memoize the provider code list in `cache` instead of listing
    /// instruments on every snapshot.
    pub fn with_code_cache(mut self, cache: Arc<ProviderCodeCache>) -> Self {
        self.code_cache = Some(cache);
        self
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.history.config().timeout)
    }

    pub async fn retrieve_pairs(&self) -> Result<Vec<Pair>, MarketDataError> {
        let pairs = self.deadline().run(self.catalog.list_pairs()).await?;
        info!("Retrieved {} pairs from {}", pairs.len(), self.client.id());
        Ok(pairs)
    }

    async fn provider_codes(&self, deadline: &Deadline) -> Result<Arc<[ProviderCode]>, MarketDataError> {
        let list = || deadline.run(self.catalog.list_provider_codes());
        match &self.code_cache {
            Some(cache) => {
                let codes = cache.get_or_load(list).await?;
                self.catalog.record_listing(&codes);
                Ok(codes)
            }
            None => Ok(Arc::from(list().await?)),
        }
    }

    /// Load the cached listing into the catalog before resolving a pair.
    async fn sync_listing(&self) -> Result<(), MarketDataError> {
        if self.code_cache.is_some() {
            self.provider_codes(&self.deadline()).await?;
        }
        Ok(())
    }

    /// Snapshot of the current quote of every known pair.
    pub async fn retrieve_current_tick(&self) -> Result<Tick, MarketDataError> {
        let deadline = self.deadline();
        let codes = self.provider_codes(&deadline).await?;
        let prices = deadline.run(self.client.get_prices(&codes)).await?;
        for price in &prices {
            self.catalog.resolve_internal_id(&price.instrument)?;
        }
        let tick = converter::to_tick(&prices)?;
        info!("Retrieved current tick for {} pairs at {}", tick.len(), tick.time);
        Ok(tick)
    }

    /// Gap-free tick series of one pair at the finest granularity.
    pub async fn retrieve_tick_history(
        &self,
        pair_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Tick>, MarketDataError> {
        self.sync_listing().await?;
        let ticks = self.history.reconstruct(pair_id, window).await?;
        info!(
            "Retrieved {} ticks for {} in [{}, {})",
            ticks.len(),
            pair_id,
            window.start(),
            window.end()
        );
        Ok(ticks)
    }

    /// Candles of one pair at `granularity`, exactly as the provider
    /// returned them. Gaps are preserved.
    pub async fn retrieve_rate_history(
        &self,
        pair_id: &str,
        granularity: Granularity,
        window: TimeWindow,
    ) -> Result<Vec<Rate>, MarketDataError> {
        self.sync_listing().await?;
        let code = self.catalog.resolve_provider_code(pair_id)?;
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let pair: PairId = Arc::from(pair_id);

        let candles = fetch_range(
            self.client.as_ref(),
            &code,
            granularity,
            window,
            self.history.config().max_candles_per_request,
            self.history.config().price_mode,
            &self.deadline(),
        )
        .await?;

        let rates = candles
            .iter()
            .map(|candle| converter::to_rate(&pair, candle))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "Retrieved {} {} rates for {} in [{}, {})",
            rates.len(),
            granularity,
            pair_id,
            window.start(),
            window.end()
        );
        Ok(rates)
    }
}
