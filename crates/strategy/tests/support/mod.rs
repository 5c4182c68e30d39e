#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use common::{PriceBar, PriceSeries};

pub const BREAKOUT_BARS: usize = 90;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

/// Sixty flat bars at 100, a slow drift down to 97.5 over bars 60..=84,
/// then a five-bar breakout of +3 per bar on rising volume. The 5/20 EMA
/// cross lands on bar 85.
pub fn breakout_series() -> PriceSeries {
    let closes: Vec<f64> = (0..BREAKOUT_BARS)
        .map(|i| {
            if i < 60 {
                100.0
            } else if i < 85 {
                100.0 - 0.1 * (i - 59) as f64
            } else {
                97.5 + 3.0 * (i - 84) as f64
            }
        })
        .collect();
    let volumes: Vec<f64> = (0..BREAKOUT_BARS)
        .map(|i| {
            if i < 80 {
                1_000.0
            } else {
                1_000.0 + 400.0 * (i - 79) as f64
            }
        })
        .collect();
    build("BRK", &closes, &volumes)
}

/// Daily bars from closes and volumes. Opens trail the previous close until
/// the breakout, where each bar opens one point under its close.
pub fn build(instrument: &str, closes: &[f64], volumes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i >= 85 {
                close - 1.0
            } else if i == 0 {
                close
            } else {
                closes[i - 1]
            };
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume,
            }
        })
        .collect();
    PriceSeries::new(instrument, bars)
}

/// The first `len` bars of `series`.
pub fn truncated(series: &PriceSeries, len: usize) -> PriceSeries {
    PriceSeries::new(series.instrument_id.clone(), series.bars[..len].to_vec())
}

/// The last `len` bars of `series`.
pub fn tail(series: &PriceSeries, len: usize) -> PriceSeries {
    let skip = series.len() - len;
    PriceSeries::new(series.instrument_id.clone(), series.bars[skip..].to_vec())
}

/// A gently rising series with constant volume.
pub fn rising_series(instrument: &str, len: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..len).map(|i| 50.0 + 0.25 * i as f64).collect();
    build(instrument, &closes, &vec![10_000.0; len])
}
