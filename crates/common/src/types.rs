use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One trading-day observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Describe the first OHLCV inconsistency on this bar, if any.
    fn defect(&self) -> Option<String> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Some(format!("{name} must be a positive finite number, got {value}"));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some(format!(
                "volume must be a non-negative finite number, got {}",
                self.volume
            ));
        }
        if self.high < self.open.max(self.close) {
            return Some(format!(
                "high {} is below max(open, close) {}",
                self.high,
                self.open.max(self.close)
            ));
        }
        if self.low > self.open.min(self.close) {
            return Some(format!(
                "low {} is above min(open, close) {}",
                self.low,
                self.open.min(self.close)
            ));
        }
        None
    }
}

/// Daily bars for exactly one instrument, oldest first.
///
/// Construction never sorts or deduplicates. Call [`PriceSeries::validate`]
/// (the evaluator always does) to reject out-of-order dates, duplicate dates
/// and inconsistent bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub instrument_id: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(instrument_id: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Check ordering, uniqueness and per-bar OHLC invariants.
    /// Reports the first violation found.
    pub fn validate(&self) -> Result<()> {
        for (index, bar) in self.bars.iter().enumerate() {
            if let Some(detail) = bar.defect() {
                return Err(self.malformed(index, detail));
            }
            if index == 0 {
                continue;
            }
            let prev = self.bars[index - 1].date;
            if bar.date == prev {
                return Err(self.malformed(index, format!("duplicate date {}", bar.date)));
            }
            if bar.date < prev {
                return Err(self.malformed(
                    index,
                    format!("date {} is earlier than preceding {}", bar.date, prev),
                ));
            }
        }
        Ok(())
    }

    fn malformed(&self, index: usize, detail: String) -> Error {
        Error::MalformedSeries {
            instrument: self.instrument_id.clone(),
            index,
            detail,
        }
    }
}

/// Strength tier attached to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
}

impl std::fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStrength::Weak => write!(f, "weak"),
            SignalStrength::Moderate => write!(f, "moderate"),
            SignalStrength::Strong => write!(f, "strong"),
        }
    }
}
