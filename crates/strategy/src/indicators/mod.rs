pub mod ema;
pub mod macd;
pub mod rsi;
pub mod set;
pub mod sma;

pub use ema::EmaIndicator;
pub use macd::{MacdIndicator, MacdSeries};
pub use rsi::RsiIndicator;
pub use set::{IndicatorParams, IndicatorSet};
pub use sma::SmaIndicator;

/// An indicator output aligned 1:1 with its input. `None` marks bars where
/// the lookback window exceeds the available history.
pub type Series = Vec<Option<f64>>;

/// 64 closes: a sawtooth of period 11 on a slow downtrend. Every value is
/// exact in binary, so reference outputs can be worked out with rationals.
#[cfg(test)]
pub(crate) fn sawtooth_closes() -> Vec<f64> {
    (0..64)
        .map(|i| 100.0 + ((i * 7) % 11) as f64 - 0.25 * i as f64)
        .collect()
}
