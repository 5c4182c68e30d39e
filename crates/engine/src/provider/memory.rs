use std::collections::HashMap;

use async_trait::async_trait;

use common::{Error, PriceSeries, PriceSeriesProvider, Result};

/// Serves series held in memory. Instruments can also be registered to fail
/// with a fixed message.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: HashMap<String, PriceSeries>,
    failures: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        let mut provider = Self::new();
        for s in series {
            provider.insert(s);
        }
        provider
    }

    /// Add or replace the series for its instrument.
    pub fn insert(&mut self, series: PriceSeries) {
        self.failures.remove(&series.instrument_id);
        self.series.insert(series.instrument_id.clone(), series);
    }

    /// Make every fetch of `instrument_id` fail with `message`.
    pub fn fail(&mut self, instrument_id: impl Into<String>, message: impl Into<String>) {
        let id = instrument_id.into();
        self.series.remove(&id);
        self.failures.insert(id, message.into());
    }

    /// Known instruments, sorted. Failing instruments are included.
    pub fn instruments(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .series
            .keys()
            .chain(self.failures.keys())
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl PriceSeriesProvider for MemoryProvider {
    async fn fetch(&self, instrument_id: &str) -> Result<PriceSeries> {
        if let Some(message) = self.failures.get(instrument_id) {
            return Err(Error::fetch(instrument_id, message.clone()));
        }
        self.series
            .get(instrument_id)
            .cloned()
            .ok_or_else(|| Error::fetch(instrument_id, "unknown instrument"))
    }
}
