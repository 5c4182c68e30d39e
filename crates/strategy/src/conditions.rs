//! The six-condition confirmed-buy rule.
//!
//! Anchored at the most recent bar (offset 0), all of these must hold:
//!
//! 1. fast EMA crossed above slow EMA at some offset `k` in
//!    `[2, crossover_lookback + 1]` (the current bar and the one before it
//!    are excluded)
//! 2. open and close both strictly above fast and slow EMA
//! 3. close strictly above the long SMA
//! 4. short-window mean volume strictly above long-window mean volume
//! 5. RSI strictly above the momentum threshold
//! 6. MACD line strictly above its signal line
//!
//! An undefined input makes its condition fail; it is never an error.

use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::aligner::{AlignedSeries, SeriesName};
use crate::evidence::{ConditionEvidence, ConditionKind, EvidenceRecord, RuleKind};
use crate::indicators::IndicatorParams;

/// Bars required before the confirmed-buy rule will evaluate.
pub const MIN_HISTORY_BARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedBuyConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_long: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    pub rsi_period: usize,
    pub rsi_threshold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Bars searched for the crossover, current and previous bar excluded.
    pub crossover_lookback: usize,
    pub min_history_bars: usize,
}

impl Default for ConfirmedBuyConfig {
    fn default() -> Self {
        Self {
            ema_fast: 5,
            ema_slow: 20,
            sma_long: 50,
            volume_short: 5,
            volume_long: 50,
            rsi_period: 14,
            rsi_threshold: 50.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            crossover_lookback: 5,
            min_history_bars: MIN_HISTORY_BARS,
        }
    }
}

impl ConfirmedBuyConfig {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            ema_fast: self.ema_fast,
            ema_slow: self.ema_slow,
            sma_long: self.sma_long,
            volume_short: self.volume_short,
            volume_long: self.volume_long,
            rsi: self.rsi_period,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            ..IndicatorParams::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.indicator_params().validate()?;
        if self.ema_fast >= self.ema_slow {
            return Err(Error::Config(format!(
                "ema_fast ({}) must be less than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        if self.volume_short >= self.volume_long {
            return Err(Error::Config(format!(
                "volume_short ({}) must be less than volume_long ({})",
                self.volume_short, self.volume_long
            )));
        }
        if self.crossover_lookback == 0 {
            return Err(Error::Config("crossover_lookback must be >= 1".into()));
        }
        if self.min_history_bars == 0 {
            return Err(Error::Config("min_history_bars must be >= 1".into()));
        }
        // the oldest crossover offset reads one bar further back
        let window = self.crossover_lookback.checked_add(2);
        if !window.is_some_and(|w| w <= self.min_history_bars) {
            return Err(Error::Config(format!(
                "crossover_lookback ({}) needs at least {} bars of history, min_history_bars is {}",
                self.crossover_lookback,
                self.crossover_lookback.saturating_add(2),
                self.min_history_bars
            )));
        }
        if !(0.0..=100.0).contains(&self.rsi_threshold) {
            return Err(Error::Config(format!(
                "rsi_threshold must be within [0, 100], got {}",
                self.rsi_threshold
            )));
        }
        Ok(())
    }

    /// Offsets searched for the crossover, nearest first.
    pub fn crossover_offsets(&self) -> std::ops::RangeInclusive<usize> {
        2..=self.crossover_lookback.saturating_add(1)
    }

    /// Evaluate all six conditions at the anchor bar.
    pub fn evaluate(&self, aligned: &AlignedSeries<'_>) -> EvidenceRecord {
        EvidenceRecord {
            rule: RuleKind::ConfirmedBuy,
            anchor_index: aligned.anchor_index().unwrap_or(0),
            conditions: vec![
                self.recent_crossover(aligned),
                price_above_emas(aligned),
                price_above_long_sma(aligned),
                volume_confirmation(aligned),
                self.momentum_confirmation(aligned),
                trend_confirmation(aligned),
            ],
        }
    }

    fn recent_crossover(&self, aligned: &AlignedSeries<'_>) -> ConditionEvidence {
        let found = self
            .crossover_offsets()
            .take_while(|&k| k < aligned.len())
            .find(|&k| aligned.crossed_above(SeriesName::EmaFast, SeriesName::EmaSlow, k));
        ConditionEvidence::new(
            ConditionKind::RecentCrossover,
            found.is_some(),
            found.map(|k| k as f64),
            Some(self.crossover_lookback.saturating_add(1) as f64),
        )
    }

    fn momentum_confirmation(&self, aligned: &AlignedSeries<'_>) -> ConditionEvidence {
        ConditionEvidence::strictly_above(
            ConditionKind::MomentumConfirmation,
            aligned.value_at(SeriesName::Rsi, 0),
            Some(self.rsi_threshold),
        )
    }
}

fn price_above_emas(aligned: &AlignedSeries<'_>) -> ConditionEvidence {
    let open = aligned.value_at(SeriesName::Open, 0);
    let close = aligned.value_at(SeriesName::Close, 0);
    let fast = aligned.value_at(SeriesName::EmaFast, 0);
    let slow = aligned.value_at(SeriesName::EmaSlow, 0);

    let passed = match (open, close, fast, slow) {
        (Some(o), Some(c), Some(f), Some(s)) => o > f && o > s && c > f && c > s,
        _ => false,
    };
    let floor = match (open, close) {
        (Some(o), Some(c)) => Some(o.min(c)),
        _ => None,
    };
    let ceiling = match (fast, slow) {
        (Some(f), Some(s)) => Some(f.max(s)),
        _ => None,
    };
    ConditionEvidence::new(ConditionKind::PriceAboveEmas, passed, floor, ceiling)
}

fn price_above_long_sma(aligned: &AlignedSeries<'_>) -> ConditionEvidence {
    ConditionEvidence::strictly_above(
        ConditionKind::PriceAboveLongSma,
        aligned.value_at(SeriesName::Close, 0),
        aligned.value_at(SeriesName::SmaLong, 0),
    )
}

fn volume_confirmation(aligned: &AlignedSeries<'_>) -> ConditionEvidence {
    let short = aligned.value_at(SeriesName::VolumeShort, 0);
    let long = aligned.value_at(SeriesName::VolumeLong, 0);
    let ratio = match (short, long) {
        (Some(s), Some(l)) if l > 0.0 => Some(s / l),
        _ => None,
    };
    ConditionEvidence::strictly_above(ConditionKind::VolumeConfirmation, ratio, Some(1.0))
}

fn trend_confirmation(aligned: &AlignedSeries<'_>) -> ConditionEvidence {
    ConditionEvidence::strictly_above(
        ConditionKind::TrendConfirmation,
        aligned.value_at(SeriesName::MacdLine, 0),
        aligned.value_at(SeriesName::MacdSignal, 0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use common::{PriceBar, PriceSeries};

    use crate::indicators::IndicatorSet;

    const LEN: usize = 12;

    /// Flat bars at 10.0 with the anchor bar trading at 12.0.
    fn series() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let bars = (0..LEN)
            .map(|i| {
                let close = if i == LEN - 1 { 12.0 } else { 10.0 };
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: close - 0.25,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect();
        PriceSeries::new("COND", bars)
    }

    /// Every condition passes; the EMA cross sits at offset `cross_at`.
    fn passing_set(cross_at: usize) -> IndicatorSet {
        let anchor = LEN - 1;
        let ema_fast = (0..LEN)
            .map(|i| Some(if i >= anchor - cross_at { 11.0 } else { 9.0 }))
            .collect();
        IndicatorSet {
            ema_fast,
            ema_slow: vec![Some(10.0); LEN],
            sma_mid: vec![Some(10.0); LEN],
            sma_long: vec![Some(10.5); LEN],
            rsi: vec![Some(60.0); LEN],
            macd_line: vec![Some(0.3); LEN],
            macd_signal: vec![Some(0.1); LEN],
            volume_short: vec![Some(1_500.0); LEN],
            volume_long: vec![Some(1_000.0); LEN],
        }
    }

    fn evaluate(set: &IndicatorSet) -> EvidenceRecord {
        let series = series();
        let aligned = AlignedSeries::new(&series, set).unwrap();
        ConfirmedBuyConfig::default().evaluate(&aligned)
    }

    #[test]
    fn all_six_conditions_pass_in_order() {
        let record = evaluate(&passing_set(3));
        assert_eq!(record.rule, RuleKind::ConfirmedBuy);
        assert_eq!(record.anchor_index, LEN - 1);
        let kinds: Vec<_> = record.conditions.iter().map(|c| c.condition).collect();
        assert_eq!(
            kinds,
            vec![
                ConditionKind::RecentCrossover,
                ConditionKind::PriceAboveEmas,
                ConditionKind::PriceAboveLongSma,
                ConditionKind::VolumeConfirmation,
                ConditionKind::MomentumConfirmation,
                ConditionKind::TrendConfirmation,
            ]
        );
        assert!(record.all_passed(), "{record:?}");
        assert_eq!(record.conditions[0].value, Some(3.0));
        assert_eq!(record.conditions[3].value, Some(1.5));
    }

    #[test]
    fn crossover_window_is_inclusive_two_to_six() {
        for (offset, expected) in [(0, false), (1, false), (2, true), (6, true), (7, false)] {
            let record = evaluate(&passing_set(offset));
            assert_eq!(
                record.get(ConditionKind::RecentCrossover).unwrap().passed,
                expected,
                "crossover at offset {offset}"
            );
        }
    }

    #[test]
    fn nearest_crossover_wins() {
        // Two crosses: offsets 5 and 2
        let mut set = passing_set(5);
        let anchor = LEN - 1;
        set.ema_fast[anchor - 3] = Some(9.5);
        let record = evaluate(&set);
        assert_eq!(record.conditions[0].value, Some(2.0));
    }

    #[test]
    fn touching_is_not_crossing() {
        let mut set = passing_set(3);
        let anchor = LEN - 1;
        // fast == slow at offset 3: offset 3 is not strictly above
        set.ema_fast[anchor - 3] = Some(10.0);
        let record = evaluate(&set);
        // the cross now happens between offsets 3 and 2
        assert_eq!(record.conditions[0].value, Some(2.0));
    }

    #[test]
    fn open_below_an_ema_fails_condition_two_only() {
        let mut set = passing_set(3);
        // anchor open is 11.75; lift the fast EMA above it but below the close
        set.ema_fast[LEN - 1] = Some(11.9);
        let record = evaluate(&set);
        let failed: Vec<_> = record.failed().collect();
        assert_eq!(failed, vec![ConditionKind::PriceAboveEmas]);
        let c = record.get(ConditionKind::PriceAboveEmas).unwrap();
        assert_eq!(c.value, Some(11.75));
        assert_eq!(c.threshold, Some(11.9));
    }

    #[test]
    fn equal_volume_means_do_not_confirm() {
        let mut set = passing_set(3);
        set.volume_short = vec![Some(1_000.0); LEN];
        let record = evaluate(&set);
        let failed: Vec<_> = record.failed().collect();
        assert_eq!(failed, vec![ConditionKind::VolumeConfirmation]);
    }

    #[test]
    fn zero_long_volume_leaves_ratio_undefined() {
        let mut set = passing_set(3);
        set.volume_short = vec![Some(0.0); LEN];
        set.volume_long = vec![Some(0.0); LEN];
        let c = *evaluate(&set).get(ConditionKind::VolumeConfirmation).unwrap();
        assert!(!c.passed);
        assert_eq!(c.value, None);
    }

    #[test]
    fn rsi_exactly_fifty_fails_momentum() {
        let mut set = passing_set(3);
        set.rsi[LEN - 1] = Some(50.0);
        let record = evaluate(&set);
        assert!(!record.get(ConditionKind::MomentumConfirmation).unwrap().passed);
        assert_eq!(record.passed_count(), 5);
    }

    #[test]
    fn undefined_indicators_fail_without_error() {
        let mut set = passing_set(3);
        set.sma_long[LEN - 1] = None;
        set.macd_signal[LEN - 1] = None;
        let record = evaluate(&set);
        let failed: Vec<_> = record.failed().collect();
        assert_eq!(
            failed,
            vec![ConditionKind::PriceAboveLongSma, ConditionKind::TrendConfirmation]
        );
        assert_eq!(record.get(ConditionKind::PriceAboveLongSma).unwrap().threshold, None);
    }

    #[test]
    fn config_validation() {
        assert!(ConfirmedBuyConfig::default().validate().is_ok());
        let bad = [
            ConfirmedBuyConfig { ema_fast: 0, ..Default::default() },
            ConfirmedBuyConfig { ema_fast: 20, ema_slow: 5, ..Default::default() },
            ConfirmedBuyConfig { volume_short: 50, ..Default::default() },
            ConfirmedBuyConfig { crossover_lookback: 0, ..Default::default() },
            ConfirmedBuyConfig { min_history_bars: 0, ..Default::default() },
            ConfirmedBuyConfig { macd_signal: 0, ..Default::default() },
            ConfirmedBuyConfig { rsi_threshold: 120.0, ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn crossover_window_must_fit_in_history() {
        let fits = ConfirmedBuyConfig {
            crossover_lookback: 58,
            ..Default::default()
        };
        assert!(fits.validate().is_ok());

        for lookback in [59, usize::MAX - 1, usize::MAX] {
            let cfg = ConfirmedBuyConfig {
                crossover_lookback: lookback,
                ..Default::default()
            };
            assert!(matches!(cfg.validate(), Err(Error::Config(_))), "{lookback}");
        }
    }

    #[test]
    fn huge_lookback_stops_at_the_first_bar() {
        let cfg = ConfirmedBuyConfig {
            crossover_lookback: usize::MAX,
            ..Default::default()
        };
        let series = series();
        // fast sits above slow on every bar, so nothing crosses
        let set = passing_set(LEN - 1);
        let aligned = AlignedSeries::new(&series, &set).unwrap();
        let record = cfg.evaluate(&aligned);
        let crossover = record.get(ConditionKind::RecentCrossover).unwrap();
        assert!(!crossover.passed);
        assert_eq!(crossover.threshold, Some(usize::MAX as f64));

        let found = cfg.evaluate(&AlignedSeries::new(&series, &passing_set(9)).unwrap());
        assert_eq!(found.conditions[0].value, Some(9.0));
    }
}
