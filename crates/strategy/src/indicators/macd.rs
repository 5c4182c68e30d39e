use common::{Error, Result};

use super::{EmaIndicator, Series};

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal_period).
/// Both lines are undefined wherever a constituent EMA is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// MACD line and signal line, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(Error::Config("MACD periods must be >= 1".into()));
        }
        if fast >= slow {
            return Err(Error::Config(format!(
                "MACD fast period ({fast}) must be less than slow period ({slow})"
            )));
        }
        Ok(Self { fast, slow, signal })
    }

    /// Compute both MACD lines from close prices (oldest first).
    pub fn compute(&self, closes: &[f64]) -> MacdSeries {
        let fast = EmaIndicator { period: self.fast }.compute(closes);
        let slow = EmaIndicator { period: self.slow }.compute(closes);

        let line: Series = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = EmaIndicator { period: self.signal }.compute_partial(&line);

        MacdSeries { line, signal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_rejects_bad_periods() {
        assert!(matches!(MacdIndicator::new(0, 26, 9), Err(Error::Config(_))));
        assert!(matches!(MacdIndicator::new(26, 12, 9), Err(Error::Config(_))));
        assert!(matches!(MacdIndicator::new(12, 26, 0), Err(Error::Config(_))));
    }

    #[test]
    fn macd_undefined_boundaries() {
        let macd = MacdIndicator::new(12, 26, 9).unwrap();
        let out = macd.compute(&trending_up(60));
        // line defined from slow - 1, signal from slow - 1 + signal - 1
        assert!(out.line[..25].iter().all(Option::is_none));
        assert!(out.line[25].is_some());
        assert!(out.signal[..33].iter().all(Option::is_none));
        assert!(out.signal[33].is_some());
    }

    #[test]
    fn macd_of_linear_series_matches_hand_values() {
        // EMA(2) lags a unit-slope line by 0.5, EMA(4) by 1.5 -> line = 1.0
        let macd = MacdIndicator::new(2, 4, 3).unwrap();
        let closes: Vec<f64> = (1..=10).map(f64::from).collect();
        let out = macd.compute(&closes);
        assert!(out.line[..3].iter().all(Option::is_none));
        for v in &out.line[3..] {
            assert!((v.unwrap() - 1.0).abs() < 1e-9, "line {v:?}");
        }
        assert!(out.signal[..5].iter().all(Option::is_none));
        for v in &out.signal[5..] {
            assert!((v.unwrap() - 1.0).abs() < 1e-9, "signal {v:?}");
        }
    }

    #[test]
    fn macd_line_above_signal_after_reversal() {
        let macd = MacdIndicator::new(3, 6, 3).unwrap();
        // Down then sharply up: the line should lead the signal upwards
        let mut prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 0.5).collect();
        prices.extend((0..20).map(|i| 90.0 + i as f64 * 2.0));
        let out = macd.compute(&prices);
        assert!(out.line[20].unwrap() <= out.signal[20].unwrap() + 1e-9);
        for i in 21..=25 {
            assert!(out.line[i].unwrap() > out.signal[i].unwrap() + 0.2, "bar {i}");
        }
    }

    #[test]
    fn macd_on_short_input_is_undefined() {
        let macd = MacdIndicator::new(12, 26, 9).unwrap();
        let out = macd.compute(&[100.0; 30]);
        assert!(out.signal.iter().all(Option::is_none));
        assert_eq!(out.line.len(), 30);
    }

    #[test]
    fn macd_reference_values_over_64_bars() {
        let out = MacdIndicator::new(12, 26, 9)
            .unwrap()
            .compute(&crate::indicators::sawtooth_closes());
        assert_eq!(out.line[24], None);
        assert_eq!(out.signal[32], None);

        for (i, line, signal) in [
            (33, -2.0828932709936105, -1.608237709997268),
            (40, -1.5001350917108542, -1.593406880644044),
            (63, -1.8993112030134085, -1.7055652221531918),
        ] {
            let (got_line, got_signal) = (out.line[i].unwrap(), out.signal[i].unwrap());
            assert!((got_line - line).abs() < 1e-9, "line at {i}: {got_line}");
            assert!((got_signal - signal).abs() < 1e-9, "signal at {i}: {got_signal}");
        }
        assert!((out.line[25].unwrap() - -1.4274443105580592).abs() < 1e-9);
    }
}
