use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::aligner::{AlignedSeries, SeriesName};
use crate::conditions::ConfirmedBuyConfig;
use crate::config::RuleConfig;
use crate::evidence::{ConditionEvidence, ConditionKind, EvidenceRecord, RuleKind};
use crate::indicators::IndicatorParams;

/// A configured detection rule. The set of rules is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    ConfirmedBuy(ConfirmedBuyConfig),
    EmaCrossover(EmaCrossoverConfig),
    GoldenCross(GoldenCrossConfig),
    VolumeBreakout(VolumeBreakoutConfig),
    MacdMomentum(MacdMomentumConfig),
    PriceAboveSma(PriceAboveSmaConfig),
}

impl Default for Rule {
    fn default() -> Self {
        Rule::ConfirmedBuy(ConfirmedBuyConfig::default())
    }
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::ConfirmedBuy(_) => RuleKind::ConfirmedBuy,
            Rule::EmaCrossover(_) => RuleKind::EmaCrossover,
            Rule::GoldenCross(_) => RuleKind::GoldenCross,
            Rule::VolumeBreakout(_) => RuleKind::VolumeBreakout,
            Rule::MacdMomentum(_) => RuleKind::MacdMomentum,
            Rule::PriceAboveSma(_) => RuleKind::PriceAboveSma,
        }
    }

    /// Windows of the indicator set this rule reads.
    pub fn indicator_params(&self) -> IndicatorParams {
        let defaults = IndicatorParams::default();
        match self {
            Rule::ConfirmedBuy(c) => c.indicator_params(),
            Rule::EmaCrossover(c) => IndicatorParams {
                ema_fast: c.fast,
                ema_slow: c.slow,
                rsi: c.rsi_period,
                ..defaults
            },
            Rule::GoldenCross(c) => IndicatorParams {
                sma_mid: c.mid,
                sma_long: c.long,
                ..defaults
            },
            Rule::VolumeBreakout(c) => IndicatorParams {
                sma_long: c.sma_period,
                volume_long: c.volume_period,
                ..defaults
            },
            Rule::MacdMomentum(c) => IndicatorParams {
                macd_fast: c.fast,
                macd_slow: c.slow,
                macd_signal: c.signal,
                rsi: c.rsi_period,
                ..defaults
            },
            Rule::PriceAboveSma(c) => IndicatorParams {
                sma_mid: c.period,
                ..defaults
            },
        }
    }

    /// Bars required before the rule will evaluate.
    pub fn min_history(&self) -> usize {
        match self {
            Rule::ConfirmedBuy(c) => c.min_history_bars,
            // crossover on the anchor needs the slow window defined one bar back
            Rule::EmaCrossover(c) => c.slow.max(c.rsi_period) + 1,
            Rule::GoldenCross(c) => c.long + 1,
            Rule::VolumeBreakout(c) => (c.sma_period + 1).max(c.volume_period),
            Rule::MacdMomentum(c) => (c.slow + c.signal).saturating_sub(1).max(c.rsi_period + 1),
            Rule::PriceAboveSma(c) => c.period + 1,
        }
    }

    /// Conditions that must hold for a verdict to be emitted.
    pub fn min_conditions(&self) -> usize {
        self.kind().min_conditions()
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Rule::ConfirmedBuy(c) => c.validate(),
            Rule::EmaCrossover(c) => {
                self.indicator_params().validate()?;
                ensure_ordered("fast", c.fast, "slow", c.slow)?;
                ensure_rsi_level("overbought", c.overbought)
            }
            Rule::GoldenCross(c) => {
                self.indicator_params().validate()?;
                ensure_ordered("mid", c.mid, "long", c.long)
            }
            Rule::VolumeBreakout(c) => {
                self.indicator_params().validate()?;
                if !c.multiplier.is_finite() || c.multiplier <= 0.0 {
                    return Err(Error::Config(format!(
                        "multiplier must be a positive number, got {}",
                        c.multiplier
                    )));
                }
                Ok(())
            }
            Rule::MacdMomentum(c) => {
                self.indicator_params().validate()?;
                ensure_rsi_level("rsi_threshold", c.rsi_threshold)
            }
            Rule::PriceAboveSma(_) => self.indicator_params().validate(),
        }
    }

    /// Evaluate every condition of the rule at the anchor bar.
    pub fn evaluate(&self, aligned: &AlignedSeries<'_>) -> EvidenceRecord {
        let conditions = match self {
            Rule::ConfirmedBuy(c) => return c.evaluate(aligned),
            Rule::EmaCrossover(c) => vec![
                crossover_at_anchor(
                    aligned,
                    ConditionKind::EmaCrossover,
                    SeriesName::EmaFast,
                    SeriesName::EmaSlow,
                ),
                strictly_below(
                    ConditionKind::NotOverbought,
                    aligned.value_at(SeriesName::Rsi, 0),
                    c.overbought,
                ),
            ],
            Rule::GoldenCross(_) => vec![crossover_at_anchor(
                aligned,
                ConditionKind::SmaCrossover,
                SeriesName::SmaMid,
                SeriesName::SmaLong,
            )],
            Rule::VolumeBreakout(c) => vec![
                crossover_at_anchor(
                    aligned,
                    ConditionKind::PriceCrossAboveSma,
                    SeriesName::Close,
                    SeriesName::SmaLong,
                ),
                ConditionEvidence::strictly_above(
                    ConditionKind::VolumeSpike,
                    aligned.value_at(SeriesName::Volume, 0),
                    aligned
                        .value_at(SeriesName::VolumeLong, 0)
                        .map(|avg| avg * c.multiplier),
                ),
            ],
            Rule::MacdMomentum(c) => vec![
                ConditionEvidence::strictly_above(
                    ConditionKind::TrendConfirmation,
                    aligned.value_at(SeriesName::MacdLine, 0),
                    aligned.value_at(SeriesName::MacdSignal, 0),
                ),
                ConditionEvidence::strictly_above(
                    ConditionKind::MacdPositive,
                    aligned.value_at(SeriesName::MacdLine, 0),
                    Some(0.0),
                ),
                ConditionEvidence::strictly_above(
                    ConditionKind::MomentumConfirmation,
                    aligned.value_at(SeriesName::Rsi, 0),
                    Some(c.rsi_threshold),
                ),
            ],
            // a cross alone scores two, as the cross implies close above the SMA
            Rule::PriceAboveSma(_) => vec![
                crossover_at_anchor(
                    aligned,
                    ConditionKind::PriceCrossAboveSma,
                    SeriesName::Close,
                    SeriesName::SmaMid,
                ),
                ConditionEvidence::strictly_above(
                    ConditionKind::PriceAboveSma,
                    aligned.value_at(SeriesName::Close, 0),
                    aligned.value_at(SeriesName::SmaMid, 0),
                ),
                ConditionEvidence::strictly_above(
                    ConditionKind::RisingClose,
                    aligned.value_at(SeriesName::Close, 0),
                    aligned.value_at(SeriesName::Close, 1),
                ),
            ],
        };
        EvidenceRecord {
            rule: self.kind(),
            anchor_index: aligned.anchor_index().unwrap_or(0),
            conditions,
        }
    }

    /// Build and validate a rule from its TOML section.
    pub fn from_config(cfg: &RuleConfig) -> Result<Self> {
        let p = &cfg.params;
        let rule = match cfg.rule_type.as_str() {
            "confirmed_buy" => {
                let d = ConfirmedBuyConfig::default();
                check_keys(
                    p,
                    &[
                        "ema_fast",
                        "ema_slow",
                        "sma_long",
                        "volume_short",
                        "volume_long",
                        "rsi_period",
                        "rsi_threshold",
                        "macd_fast",
                        "macd_slow",
                        "macd_signal",
                        "crossover_lookback",
                        "min_history_bars",
                    ],
                )?;
                Rule::ConfirmedBuy(ConfirmedBuyConfig {
                    ema_fast: param_usize(p, "ema_fast", d.ema_fast)?,
                    ema_slow: param_usize(p, "ema_slow", d.ema_slow)?,
                    sma_long: param_usize(p, "sma_long", d.sma_long)?,
                    volume_short: param_usize(p, "volume_short", d.volume_short)?,
                    volume_long: param_usize(p, "volume_long", d.volume_long)?,
                    rsi_period: param_usize(p, "rsi_period", d.rsi_period)?,
                    rsi_threshold: param_f64(p, "rsi_threshold", d.rsi_threshold)?,
                    macd_fast: param_usize(p, "macd_fast", d.macd_fast)?,
                    macd_slow: param_usize(p, "macd_slow", d.macd_slow)?,
                    macd_signal: param_usize(p, "macd_signal", d.macd_signal)?,
                    crossover_lookback: param_usize(p, "crossover_lookback", d.crossover_lookback)?,
                    min_history_bars: param_usize(p, "min_history_bars", d.min_history_bars)?,
                })
            }
            "ema_crossover" => {
                let d = EmaCrossoverConfig::default();
                check_keys(p, &["fast", "slow", "rsi_period", "overbought"])?;
                Rule::EmaCrossover(EmaCrossoverConfig {
                    fast: param_usize(p, "fast", d.fast)?,
                    slow: param_usize(p, "slow", d.slow)?,
                    rsi_period: param_usize(p, "rsi_period", d.rsi_period)?,
                    overbought: param_f64(p, "overbought", d.overbought)?,
                })
            }
            "golden_cross" => {
                let d = GoldenCrossConfig::default();
                check_keys(p, &["mid", "long"])?;
                Rule::GoldenCross(GoldenCrossConfig {
                    mid: param_usize(p, "mid", d.mid)?,
                    long: param_usize(p, "long", d.long)?,
                })
            }
            "volume_breakout" => {
                let d = VolumeBreakoutConfig::default();
                check_keys(p, &["sma_period", "volume_period", "multiplier"])?;
                Rule::VolumeBreakout(VolumeBreakoutConfig {
                    sma_period: param_usize(p, "sma_period", d.sma_period)?,
                    volume_period: param_usize(p, "volume_period", d.volume_period)?,
                    multiplier: param_f64(p, "multiplier", d.multiplier)?,
                })
            }
            "macd_momentum" => {
                let d = MacdMomentumConfig::default();
                check_keys(p, &["fast", "slow", "signal", "rsi_period", "rsi_threshold"])?;
                Rule::MacdMomentum(MacdMomentumConfig {
                    fast: param_usize(p, "fast", d.fast)?,
                    slow: param_usize(p, "slow", d.slow)?,
                    signal: param_usize(p, "signal", d.signal)?,
                    rsi_period: param_usize(p, "rsi_period", d.rsi_period)?,
                    rsi_threshold: param_f64(p, "rsi_threshold", d.rsi_threshold)?,
                })
            }
            "price_above_sma" => {
                let d = PriceAboveSmaConfig::default();
                check_keys(p, &["period"])?;
                Rule::PriceAboveSma(PriceAboveSmaConfig {
                    period: param_usize(p, "period", d.period)?,
                })
            }
            other => return Err(Error::Config(format!("unknown rule type '{other}'"))),
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl RuleKind {
    pub fn min_conditions(&self) -> usize {
        match self {
            RuleKind::ConfirmedBuy => 6,
            RuleKind::EmaCrossover => 2,
            RuleKind::GoldenCross => 1,
            RuleKind::VolumeBreakout => 2,
            RuleKind::MacdMomentum => 2,
            RuleKind::PriceAboveSma => 2,
        }
    }
}

// ─── Simple rule parameters ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaCrossoverConfig {
    pub fast: usize,
    pub slow: usize,
    pub rsi_period: usize,
    pub overbought: f64,
}

impl Default for EmaCrossoverConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            rsi_period: 14,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoldenCrossConfig {
    pub mid: usize,
    pub long: usize,
}

impl Default for GoldenCrossConfig {
    fn default() -> Self {
        Self { mid: 50, long: 200 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBreakoutConfig {
    pub sma_period: usize,
    pub volume_period: usize,
    pub multiplier: f64,
}

impl Default for VolumeBreakoutConfig {
    fn default() -> Self {
        Self {
            sma_period: 200,
            volume_period: 20,
            multiplier: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdMomentumConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub rsi_period: usize,
    pub rsi_threshold: f64,
}

impl Default for MacdMomentumConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            rsi_period: 14,
            rsi_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAboveSmaConfig {
    pub period: usize,
}

impl Default for PriceAboveSmaConfig {
    fn default() -> Self {
        Self { period: 50 }
    }
}

// ─── Condition helpers ────────────────────────────────────────────────────────

fn crossover_at_anchor(
    aligned: &AlignedSeries<'_>,
    condition: ConditionKind,
    fast: SeriesName,
    slow: SeriesName,
) -> ConditionEvidence {
    ConditionEvidence::new(
        condition,
        aligned.crossed_above(fast, slow, 0),
        aligned.value_at(fast, 0),
        aligned.value_at(slow, 0),
    )
}

fn strictly_below(condition: ConditionKind, value: Option<f64>, threshold: f64) -> ConditionEvidence {
    let passed = matches!(value, Some(v) if v < threshold);
    ConditionEvidence::new(condition, passed, value, Some(threshold))
}

fn ensure_ordered(short_name: &str, short: usize, long_name: &str, long: usize) -> Result<()> {
    if short >= long {
        return Err(Error::Config(format!(
            "{short_name} ({short}) must be less than {long_name} ({long})"
        )));
    }
    Ok(())
}

fn ensure_rsi_level(name: &str, level: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&level) {
        return Err(Error::Config(format!(
            "{name} must be within [0, 100], got {level}"
        )));
    }
    Ok(())
}

// ─── Param parsing ────────────────────────────────────────────────────────────

fn check_keys(params: &HashMap<String, toml::Value>, known: &[&str]) -> Result<()> {
    let mut unknown: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(Error::Config(format!(
        "unknown rule params: {}",
        unknown.join(", ")
    )))
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> Result<f64> {
    let Some(value) = params.get(key) else {
        return Ok(default);
    };
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Config(format!("param '{key}' must be a number, got {value}")))
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    let Some(value) = params.get(key) else {
        return Ok(default);
    };
    value
        .as_integer()
        .filter(|v| *v > 0)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            Error::Config(format!("param '{key}' must be a positive integer, got {value}"))
        })
}
