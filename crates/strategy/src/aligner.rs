use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use common::{Error, PriceSeries, Result};

use crate::indicators::IndicatorSet;

/// Every column an evaluation can look up, raw or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesName {
    Open,
    High,
    Low,
    Close,
    Volume,
    EmaFast,
    EmaSlow,
    SmaMid,
    SmaLong,
    Rsi,
    MacdLine,
    MacdSignal,
    VolumeShort,
    VolumeLong,
}

/// A price series and its indicators viewed from the most recent bar.
///
/// Offset `0` is the anchor ("current candle"), `1` the bar before it, and so
/// on. Lookups past the start of history or onto an undefined indicator value
/// return `None`. No computation happens here, only index translation.
#[derive(Debug, Clone, Copy)]
pub struct AlignedSeries<'a> {
    series: &'a PriceSeries,
    indicators: &'a IndicatorSet,
}

impl<'a> AlignedSeries<'a> {
    /// Pair a series with its indicator set. Every indicator column must have
    /// exactly one entry per bar.
    pub fn new(series: &'a PriceSeries, indicators: &'a IndicatorSet) -> Result<Self> {
        for (name, column) in indicators.columns() {
            if column.len() != series.len() {
                return Err(Error::Config(format!(
                    "indicator column '{name}' has {} values for {} bars of {}",
                    column.len(),
                    series.len(),
                    series.instrument_id
                )));
            }
        }
        Ok(Self { series, indicators })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn instrument_id(&self) -> &'a str {
        &self.series.instrument_id
    }

    /// Absolute index of the anchor bar.
    pub fn anchor_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.series.last().map(|b| b.date)
    }

    /// Value of `name` `offset` bars before the anchor.
    pub fn value_at(&self, name: SeriesName, offset: usize) -> Option<f64> {
        let index = self.len().checked_sub(offset.checked_add(1)?)?;
        let bar = &self.series.bars[index];
        match name {
            SeriesName::Open => Some(bar.open),
            SeriesName::High => Some(bar.high),
            SeriesName::Low => Some(bar.low),
            SeriesName::Close => Some(bar.close),
            SeriesName::Volume => Some(bar.volume),
            SeriesName::EmaFast => at(&self.indicators.ema_fast, index),
            SeriesName::EmaSlow => at(&self.indicators.ema_slow, index),
            SeriesName::SmaMid => at(&self.indicators.sma_mid, index),
            SeriesName::SmaLong => at(&self.indicators.sma_long, index),
            SeriesName::Rsi => at(&self.indicators.rsi, index),
            SeriesName::MacdLine => at(&self.indicators.macd_line, index),
            SeriesName::MacdSignal => at(&self.indicators.macd_signal, index),
            SeriesName::VolumeShort => at(&self.indicators.volume_short, index),
            SeriesName::VolumeLong => at(&self.indicators.volume_long, index),
        }
    }

    /// True when `fast` was at or below `slow` at `offset + 1` and strictly
    /// above it at `offset`. Any undefined input yields `false`.
    pub fn crossed_above(&self, fast: SeriesName, slow: SeriesName, offset: usize) -> bool {
        let prev = offset.saturating_add(1);
        let values = (
            self.value_at(fast, prev),
            self.value_at(slow, prev),
            self.value_at(fast, offset),
            self.value_at(slow, offset),
        );
        match values {
            (Some(fast_prev), Some(slow_prev), Some(fast_cur), Some(slow_cur)) => {
                fast_prev <= slow_prev && fast_cur > slow_cur
            }
            _ => false,
        }
    }
}

fn at(column: &[Option<f64>], index: usize) -> Option<f64> {
    column.get(index).copied().flatten()
}
