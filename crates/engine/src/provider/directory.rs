use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use common::{Error, PriceBar, PriceSeries, PriceSeriesProvider, Result};

/// Reads daily bars from `<dir>/<INSTRUMENT>.csv`.
///
/// Files need a header row `date,open,high,low,close,volume` with ISO dates
/// (`2024-01-31`). Rows are returned in file order; ordering problems are left
/// for series validation to report.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every instrument with a `.csv` file in the directory, sorted.
    pub async fn instruments(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn path_for(&self, instrument_id: &str) -> Result<PathBuf> {
        let invalid = instrument_id.is_empty()
            || instrument_id.contains(['/', '\\'])
            || instrument_id.starts_with('.');
        if invalid {
            return Err(Error::fetch(instrument_id, "invalid instrument id"));
        }
        Ok(self.dir.join(format!("{instrument_id}.csv")))
    }
}

#[async_trait]
impl PriceSeriesProvider for CsvDirectoryProvider {
    async fn fetch(&self, instrument_id: &str) -> Result<PriceSeries> {
        let path = self.path_for(instrument_id)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::fetch(instrument_id, format!("{}: {e}", path.display())))?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());
        let bars = reader
            .deserialize::<PriceBar>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(instrument = %instrument_id, bars = bars.len(), path = %path.display(), "Loaded CSV series");
        Ok(PriceSeries::new(instrument_id, bars))
    }
}
