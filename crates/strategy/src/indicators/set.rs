use serde::{Deserialize, Serialize};

use common::{Error, PriceSeries, Result};

use super::{EmaIndicator, MacdIndicator, RsiIndicator, Series, SmaIndicator};

/// Window lengths for every column of an [`IndicatorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_mid: usize,
    pub sma_long: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 5,
            ema_slow: 20,
            sma_mid: 20,
            sma_long: 50,
            volume_short: 5,
            volume_long: 50,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorParams {
    /// Reject zero windows and inverted MACD periods.
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("sma_mid", self.sma_mid),
            ("sma_long", self.sma_long),
            ("volume_short", self.volume_short),
            ("volume_long", self.volume_long),
            ("rsi", self.rsi),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(Error::Config(format!("{name} window must be >= 1")));
            }
        }
        MacdIndicator::new(self.macd_fast, self.macd_slow, self.macd_signal)?;
        Ok(())
    }
}

/// Derived series aligned 1:1 with a [`PriceSeries`].
///
/// Fields are public so callers can build a set by hand (tests, what-if
/// analysis); the engine itself only ever reads one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub ema_fast: Series,
    pub ema_slow: Series,
    pub sma_mid: Series,
    pub sma_long: Series,
    pub rsi: Series,
    pub macd_line: Series,
    pub macd_signal: Series,
    /// Mean volume over the short window (includes the current bar).
    pub volume_short: Series,
    /// Mean volume over the long window (includes the current bar).
    pub volume_long: Series,
}

impl IndicatorSet {
    /// Compute every column fresh from `series`.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Result<Self> {
        params.validate()?;
        let closes = series.closes();
        let volumes = series.volumes();

        let macd = MacdIndicator::new(params.macd_fast, params.macd_slow, params.macd_signal)?
            .compute(&closes);

        Ok(Self {
            ema_fast: EmaIndicator::new(params.ema_fast)?.compute(&closes),
            ema_slow: EmaIndicator::new(params.ema_slow)?.compute(&closes),
            sma_mid: SmaIndicator::new(params.sma_mid)?.compute(&closes),
            sma_long: SmaIndicator::new(params.sma_long)?.compute(&closes),
            rsi: RsiIndicator::new(params.rsi)?.compute(&closes),
            macd_line: macd.line,
            macd_signal: macd.signal,
            volume_short: SmaIndicator::new(params.volume_short)?.compute(&volumes),
            volume_long: SmaIndicator::new(params.volume_long)?.compute(&volumes),
        })
    }

    /// All columns paired with their names, in declaration order.
    pub fn columns(&self) -> [(&'static str, &Series); 9] {
        [
            ("ema_fast", &self.ema_fast),
            ("ema_slow", &self.ema_slow),
            ("sma_mid", &self.sma_mid),
            ("sma_long", &self.sma_long),
            ("rsi", &self.rsi),
            ("macd_line", &self.macd_line),
            ("macd_signal", &self.macd_signal),
            ("volume_short", &self.volume_short),
            ("volume_long", &self.volume_long),
        ]
    }
}
