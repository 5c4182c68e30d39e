use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which rule produced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    ConfirmedBuy,
    EmaCrossover,
    GoldenCross,
    VolumeBreakout,
    MacdMomentum,
    PriceAboveSma,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ConfirmedBuy => "confirmed_buy",
            RuleKind::EmaCrossover => "ema_crossover",
            RuleKind::GoldenCross => "golden_cross",
            RuleKind::VolumeBreakout => "volume_breakout",
            RuleKind::MacdMomentum => "macd_momentum",
            RuleKind::PriceAboveSma => "price_above_sma",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named check inside a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Fast EMA crossed above slow EMA inside the lookback window.
    RecentCrossover,
    /// Open and close both above fast and slow EMA.
    PriceAboveEmas,
    /// Close above the long SMA.
    PriceAboveLongSma,
    /// Short volume mean above long volume mean.
    VolumeConfirmation,
    /// RSI above its midline.
    MomentumConfirmation,
    /// MACD line above its signal line.
    TrendConfirmation,
    /// Fast EMA crossed above slow EMA on the anchor bar.
    EmaCrossover,
    /// RSI below the overbought level.
    NotOverbought,
    /// Mid SMA crossed above long SMA on the anchor bar.
    SmaCrossover,
    /// Close crossed above an SMA on the anchor bar.
    PriceCrossAboveSma,
    /// Anchor volume above a multiple of its moving average.
    VolumeSpike,
    /// MACD line above zero.
    MacdPositive,
    /// Close above the mid SMA.
    PriceAboveSma,
    /// Close above the previous close.
    RisingClose,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::RecentCrossover => "recent_crossover",
            ConditionKind::PriceAboveEmas => "price_above_emas",
            ConditionKind::PriceAboveLongSma => "price_above_long_sma",
            ConditionKind::VolumeConfirmation => "volume_confirmation",
            ConditionKind::MomentumConfirmation => "momentum_confirmation",
            ConditionKind::TrendConfirmation => "trend_confirmation",
            ConditionKind::EmaCrossover => "ema_crossover",
            ConditionKind::NotOverbought => "not_overbought",
            ConditionKind::SmaCrossover => "sma_crossover",
            ConditionKind::PriceCrossAboveSma => "price_cross_above_sma",
            ConditionKind::VolumeSpike => "volume_spike",
            ConditionKind::MacdPositive => "macd_positive",
            ConditionKind::PriceAboveSma => "price_above_sma",
            ConditionKind::RisingClose => "rising_close",
        }
    }
}

/// Outcome of one condition plus the numbers it was decided on.
///
/// `value` is the measured quantity and `threshold` what it was compared
/// against; either is `None` when the underlying data was undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionEvidence {
    pub condition: ConditionKind,
    pub passed: bool,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

impl ConditionEvidence {
    pub fn new(
        condition: ConditionKind,
        passed: bool,
        value: Option<f64>,
        threshold: Option<f64>,
    ) -> Self {
        Self {
            condition,
            passed,
            value,
            threshold,
        }
    }

    /// `passed` iff both sides are defined and `value > threshold`.
    pub fn strictly_above(
        condition: ConditionKind,
        value: Option<f64>,
        threshold: Option<f64>,
    ) -> Self {
        let passed = matches!((value, threshold), (Some(v), Some(t)) if v > t);
        Self::new(condition, passed, value, threshold)
    }
}

/// Auditable record of one rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub rule: RuleKind,
    /// Absolute index of the bar the evaluation was anchored to.
    pub anchor_index: usize,
    pub conditions: Vec<ConditionEvidence>,
}

/// Scalar in a flattened evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Bool(bool),
    Number(f64),
}

impl EvidenceRecord {
    pub fn passed_count(&self) -> usize {
        self.conditions.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.conditions.len()
    }

    pub fn all_passed(&self) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.passed)
    }

    pub fn get(&self, condition: ConditionKind) -> Option<&ConditionEvidence> {
        self.conditions.iter().find(|c| c.condition == condition)
    }

    /// Conditions that did not hold, in evaluation order.
    pub fn failed(&self) -> impl Iterator<Item = ConditionKind> + '_ {
        self.conditions
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.condition)
    }

    /// Flatten to numbers and booleans only, for storage and rendering.
    /// Undefined values are left out.
    pub fn flatten(&self) -> BTreeMap<String, FlatValue> {
        let mut flat = BTreeMap::new();
        flat.insert(
            "anchor_index".to_string(),
            FlatValue::Number(self.anchor_index as f64),
        );
        flat.insert(
            "conditions_met".to_string(),
            FlatValue::Number(self.passed_count() as f64),
        );
        flat.insert(
            "conditions_total".to_string(),
            FlatValue::Number(self.total() as f64),
        );
        for c in &self.conditions {
            let name = c.condition.as_str();
            flat.insert(name.to_string(), FlatValue::Bool(c.passed));
            if let Some(v) = c.value {
                flat.insert(format!("{name}_value"), FlatValue::Number(v));
            }
            if let Some(t) = c.threshold {
                flat.insert(format!("{name}_threshold"), FlatValue::Number(t));
            }
        }
        flat
    }
}
