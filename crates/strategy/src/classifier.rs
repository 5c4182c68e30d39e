use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use common::SignalStrength;

use crate::evidence::{EvidenceRecord, RuleKind};

/// Outcome of evaluating one rule against one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub instrument_id: String,
    pub rule: RuleKind,
    pub emitted: bool,
    pub strength: SignalStrength,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub evidence: EvidenceRecord,
    /// Date of the bar the evaluation was anchored to.
    pub anchor_date: NaiveDate,
}

/// Turn an evidence record into a verdict.
///
/// The confirmed-buy rule is all-or-nothing: it emits only when every
/// condition holds, and an emitted verdict is always strong with confidence
/// 1.0. The simple rules score `met / total` and emit once
/// [`RuleKind::min_conditions`] are met.
pub fn classify(
    instrument_id: impl Into<String>,
    evidence: EvidenceRecord,
    anchor_date: NaiveDate,
) -> Verdict {
    let met = evidence.passed_count();
    let total = evidence.total();

    let (emitted, strength, confidence) = match evidence.rule {
        RuleKind::ConfirmedBuy => {
            let emitted = evidence.all_passed();
            let confidence = if emitted { 1.0 } else { 0.0 };
            (emitted, SignalStrength::Strong, confidence)
        }
        kind => {
            let emitted = total > 0 && met >= kind.min_conditions();
            let strength = if total > 0 && met == total {
                SignalStrength::Strong
            } else if emitted {
                SignalStrength::Moderate
            } else {
                SignalStrength::Weak
            };
            let confidence = if total == 0 {
                0.0
            } else {
                met as f64 / total as f64
            };
            (emitted, strength, confidence)
        }
    };

    Verdict {
        instrument_id: instrument_id.into(),
        rule: evidence.rule,
        emitted,
        strength,
        confidence,
        evidence,
        anchor_date,
    }
}
