use common::{Error, Result};

use super::Series;

/// RSI (Relative Strength Index) indicator.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI):
/// the first average gain/loss is the simple mean of the first `period`
/// changes, later averages follow `avg = (avg * (period - 1) + x) / period`.
/// Index `i` is undefined for `i < period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::Config("RSI period must be >= 1".into()));
        }
        Ok(Self { period })
    }

    /// Compute RSI for every bar of a close series (oldest first).
    pub fn compute(&self, closes: &[f64]) -> Series {
        let mut out = vec![None; closes.len()];
        if closes.len() < self.period + 1 {
            return out;
        }

        let gains: Vec<f64> = closes.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();
        let losses: Vec<f64> = closes.windows(2).map(|w| (w[0] - w[1]).max(0.0)).collect();
        let n = self.period as f64;

        // First average gain/loss over the initial `period` changes
        let mut avg_gain = gains[..self.period].iter().sum::<f64>() / n;
        let mut avg_loss = losses[..self.period].iter().sum::<f64>() / n;
        out[self.period] = Some(rsi_value(avg_gain, avg_loss));

        // Wilder smoothing over remaining changes; change j ends at bar j + 1
        for j in self.period..gains.len() {
            avg_gain = (avg_gain * (n - 1.0) + gains[j]) / n;
            avg_loss = (avg_loss * (n - 1.0) + losses[j]) / n;
            out[j + 1] = Some(rsi_value(avg_gain, avg_loss));
        }
        out
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
