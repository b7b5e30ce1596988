use std::sync::Arc;

/// Internal pair identifier discovered at runtime (e.g. "EURUSD")
pub type PairId = Arc<str>;

/// Provider-specific instrument code (e.g. "EUR_USD")
pub type ProviderCode = Arc<str>;
