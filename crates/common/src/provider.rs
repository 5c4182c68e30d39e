use async_trait::async_trait;

use crate::{PriceSeries, Result};

/// Source of historical price data for one instrument at a time.
///
/// `CsvDirectoryProvider` reads daily bars from disk.
/// `MemoryProvider` serves pre-built series for tests and embedding.
///
/// Implementations own retries, caching and rate limiting. The batch runner
/// treats every returned error as final and records it as a fetch failure
/// without reinterpreting it.
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    /// Fetch the full daily history for `instrument_id`, oldest bar first.
    async fn fetch(&self, instrument_id: &str) -> Result<PriceSeries>;
}
