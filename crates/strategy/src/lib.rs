pub mod aligner;
pub mod classifier;
pub mod conditions;
pub mod config;
pub mod evidence;
pub mod indicators;
pub mod rules;

pub use aligner::{AlignedSeries, SeriesName};
pub use classifier::{classify, Verdict};
pub use conditions::{ConfirmedBuyConfig, MIN_HISTORY_BARS};
pub use config::{RuleConfig, ScanFileConfig, ScanSection};
pub use evidence::{ConditionEvidence, ConditionKind, EvidenceRecord, FlatValue, RuleKind};
pub use indicators::{IndicatorParams, IndicatorSet};
pub use rules::Rule;

use tracing::debug;

use common::{Error, PriceSeries, Result};

/// Evaluate `rule` against the most recent bar of `series`.
///
/// Errors are reserved for bad input: a malformed series, too little history
/// or an invalid rule. A series that simply does not meet the rule yields an
/// `Ok` verdict with `emitted == false`.
pub fn evaluate(series: &PriceSeries, rule: &Rule) -> Result<Verdict> {
    rule.validate()?;
    series.validate()?;

    let required = rule.min_history();
    if series.len() < required {
        return Err(Error::InsufficientHistory {
            instrument: series.instrument_id.clone(),
            available: series.len(),
            required,
        });
    }

    let indicators = IndicatorSet::compute(series, &rule.indicator_params())?;
    evaluate_with(series, &indicators, rule)
}

/// Evaluate `rule` against a precomputed indicator set.
///
/// History length is not checked here; undefined indicator values simply
/// fail their conditions.
pub fn evaluate_with(series: &PriceSeries, indicators: &IndicatorSet, rule: &Rule) -> Result<Verdict> {
    let aligned = AlignedSeries::new(series, indicators)?;
    let anchor_date = aligned.anchor_date().ok_or_else(|| Error::InsufficientHistory {
        instrument: series.instrument_id.clone(),
        available: 0,
        required: rule.min_history().max(1),
    })?;

    let evidence = rule.evaluate(&aligned);
    let verdict = classify(series.instrument_id.as_str(), evidence, anchor_date);
    debug!(
        instrument = %verdict.instrument_id,
        rule = %verdict.rule,
        emitted = verdict.emitted,
        met = verdict.evidence.passed_count(),
        total = verdict.evidence.total(),
        "Rule evaluated"
    );
    Ok(verdict)
}
