use common::{Error, Result};

use super::Series;

/// Exponential Moving Average with smoothing factor `2 / (period + 1)`.
///
/// The first defined value (index `period - 1`) is seeded with the SMA of the
/// first `period` observations; every later value follows
/// `ema = k * price + (1 - k) * ema_prev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmaIndicator {
    pub period: usize,
}

impl EmaIndicator {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::Config("EMA period must be >= 1".into()));
        }
        Ok(Self { period })
    }

    pub fn smoothing(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Same-length output; `None` before the seed point.
    pub fn compute(&self, values: &[f64]) -> Series {
        let mut out = vec![None; values.len()];
        if values.len() < self.period {
            return out;
        }
        let k = self.smoothing();

        // Seed with SMA of first `period` values
        let mut ema_val = values[..self.period].iter().sum::<f64>() / self.period as f64;
        out[self.period - 1] = Some(ema_val);

        for (i, &price) in values.iter().enumerate().skip(self.period) {
            ema_val = k * price + (1.0 - k) * ema_val;
            out[i] = Some(ema_val);
        }
        out
    }

    /// EMA over a series whose leading values may be undefined.
    ///
    /// Leading `None`s are skipped and the EMA runs over the defined suffix.
    /// The suffix must be contiguous: output stops at the first gap after it.
    pub fn compute_partial(&self, values: &[Option<f64>]) -> Series {
        let mut out = vec![None; values.len()];
        let Some(start) = values.iter().position(Option::is_some) else {
            return out;
        };
        let defined: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
        for (offset, value) in self.compute(&defined).into_iter().enumerate() {
            out[start + offset] = value;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_zero_period_is_config_error() {
        assert!(matches!(EmaIndicator::new(0), Err(Error::Config(_))));
    }

    #[test]
    fn ema_seeds_with_sma_then_recurs() {
        let ema = EmaIndicator::new(3).unwrap();
        // k = 0.5; seed = mean(1,2,3) = 2; then 0.5*4+0.5*2 = 3, 0.5*5+0.5*3 = 4
        let out = ema.compute(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let expected = [None, None, Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        for (got, want) in out.iter().zip(expected) {
            match (got, want) {
                (None, None) => {}
                (Some(g), Some(w)) => assert!((g - w).abs() < 1e-9, "got {g}, want {w}"),
                _ => panic!("definedness mismatch: {out:?}"),
            }
        }
    }

    #[test]
    fn ema_seed_differs_from_first_value_seeding() {
        // Seeding with the first observation would give 10 at index 1;
        // SMA seeding gives the mean of the first two.
        let out = EmaIndicator::new(2).unwrap().compute(&[10.0, 20.0, 20.0]);
        assert_eq!(out[0], None);
        assert!((out[1].unwrap() - 15.0).abs() < 1e-9);
        // k = 2/3: 2/3*20 + 1/3*15
        assert!((out[2].unwrap() - (40.0 / 3.0 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let out = EmaIndicator::new(5).unwrap().compute(&[7.0; 20]);
        assert!(out[4..].iter().all(|v| (v.unwrap() - 7.0).abs() < 1e-12));
    }

    #[test]
    fn partial_ema_skips_leading_undefined() {
        let ema = EmaIndicator::new(2).unwrap();
        let input = vec![None, None, Some(1.0), Some(3.0), Some(5.0)];
        let out = ema.compute_partial(&input);
        assert_eq!(out[..3], [None, None, None]);
        assert!((out[3].unwrap() - 2.0).abs() < 1e-9);
        // 2/3*5 + 1/3*2 = 4
        assert!((out[4].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn partial_ema_of_all_undefined_is_undefined() {
        let out = EmaIndicator::new(3).unwrap().compute_partial(&vec![None; 4]);
        assert_eq!(out, vec![None; 4]);
    }

    #[test]
    fn ema_reference_values_over_64_bars() {
        let closes = crate::indicators::sawtooth_closes();
        let fast = EmaIndicator::new(5).unwrap().compute(&closes);
        let slow = EmaIndicator::new(20).unwrap().compute(&closes);
        assert!(fast[..4].iter().all(Option::is_none));
        assert!(slow[..19].iter().all(Option::is_none));

        let cases = [
            (&fast, 19, 99.910883654762),
            (&fast, 40, 96.24410439211995),
            (&fast, 63, 88.91273650902748),
            (&slow, 19, 102.525),
            (&slow, 40, 97.65769579460945),
            (&slow, 63, 91.49703509966241),
        ];
        for (out, i, want) in cases {
            let got = out[i].unwrap();
            assert!((got - want).abs() < 1e-9, "bar {i}: got {got}, want {want}");
        }
    }
}
