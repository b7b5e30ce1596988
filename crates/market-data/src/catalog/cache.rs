use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::errors::MarketDataError;
use crate::models::ProviderCode;

/// Compute-once store for the provider codes of every known pair.
///
/// The first successful load is kept for the lifetime of the cache;
/// concurrent callers wait for that load instead of issuing their own.
/// A failed load leaves the cache empty so the next call tries again.
///
/// Share one cache between retrievers with `Arc` to scope memoization to a
/// session.
#[derive(Debug, Default)]
pub struct ProviderCodeCache {
    codes: OnceCell<Arc<[ProviderCode]>>,
}

impl ProviderCodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached codes, if already loaded.
    pub fn get(&self) -> Option<Arc<[ProviderCode]>> {
        self.codes.get().cloned()
    }

    /// Return the cached codes, running `load` on first use.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<[ProviderCode]>, MarketDataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ProviderCode>, MarketDataError>>,
    {
        let codes = self
            .codes
            .get_or_try_init(|| async move { load().await.map(Arc::from) })
            .await?;
        Ok(codes.clone())
    }
}
