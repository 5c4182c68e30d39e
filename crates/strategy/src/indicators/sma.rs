use common::{Error, Result};

use super::Series;

/// Simple Moving Average: unweighted mean of the trailing `period` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::Config("SMA period must be >= 1".into()));
        }
        Ok(Self { period })
    }

    /// Same-length output; `None` for indices `< period - 1`.
    pub fn compute(&self, values: &[f64]) -> Series {
        let mut out = vec![None; values.len()];
        if values.len() < self.period {
            return out;
        }
        for i in self.period - 1..values.len() {
            let window = &values[i + 1 - self.period..=i];
            out[i] = Some(window.iter().sum::<f64>() / self.period as f64);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_zero_period_is_config_error() {
        assert!(matches!(SmaIndicator::new(0), Err(Error::Config(_))));
    }

    #[test]
    fn sma_known_values() {
        let sma = SmaIndicator::new(3).unwrap();
        let out = sma.compute(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0), Some(5.0)]);
    }

    #[test]
    fn sma_50_boundary_on_60_bars() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let out = SmaIndicator::new(50).unwrap().compute(&values);
        assert_eq!(out.len(), 60);
        assert!(out[..49].iter().all(Option::is_none));
        // mean of 100..=149
        let first = out[49].unwrap();
        assert!((first - 124.5).abs() < 1e-9, "got {first}");
        assert!((out[59].unwrap() - 134.5).abs() < 1e-9);
    }

    #[test]
    fn sma_short_and_empty_input_are_all_undefined() {
        let sma = SmaIndicator::new(5).unwrap();
        assert_eq!(sma.compute(&[1.0, 2.0]), vec![None, None]);
        assert!(sma.compute(&[]).is_empty());
    }
}
