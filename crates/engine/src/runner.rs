use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::{Error, PriceSeriesProvider, Result};
use strategy::{Rule, Verdict};

use crate::result::{BatchResult, FailureReason};
use crate::status::BatchStatus;

enum Outcome {
    Evaluated(Verdict),
    Failed(FailureReason),
    /// Cancellation was observed before the instrument started.
    Skipped,
}

/// Evaluates one rule across many instruments.
///
/// Each instrument is independent: a fetch or evaluation failure is recorded
/// against that instrument and the batch carries on.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    rule: Rule,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(rule: Rule, concurrency: usize) -> Result<Self> {
        rule.validate()?;
        if concurrency == 0 {
            return Err(Error::Config("concurrency must be >= 1".into()));
        }
        Ok(Self { rule, concurrency })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run the batch to completion or cancellation.
    ///
    /// `cancel` is checked before each instrument starts; instruments already
    /// in flight finish normally. Instruments never started appear in neither
    /// `verdicts` nor `failures`.
    pub async fn run(
        &self,
        instruments: &[String],
        provider: Arc<dyn PriceSeriesProvider>,
        status: &BatchStatus,
        cancel: watch::Receiver<bool>,
    ) -> BatchResult {
        let run_id = Uuid::new_v4();
        let ids = dedupe(instruments);
        status.begin(run_id, ids.len()).await;
        info!(
            %run_id,
            rule = %self.rule.kind(),
            instruments = ids.len(),
            concurrency = self.concurrency,
            "Batch started"
        );

        let rule = self.rule;
        let mut outcomes = stream::iter(ids.iter().cloned())
            .map(|id| {
                let provider = provider.clone();
                let cancel = cancel.clone();
                async move {
                    let stop = *cancel.borrow();
                    if stop {
                        return (id, Outcome::Skipped);
                    }
                    let outcome = match provider.fetch(&id).await {
                        Err(e) => Outcome::Failed(FailureReason::fetch(e)),
                        Ok(series) => match strategy::evaluate(&series, &rule) {
                            Ok(verdict) => Outcome::Evaluated(verdict),
                            Err(e) => Outcome::Failed(FailureReason::from(e)),
                        },
                    };
                    (id, outcome)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut verdicts = Vec::new();
        let mut failures = BTreeMap::new();
        let mut skipped = 0usize;

        while let Some((id, outcome)) = outcomes.next().await {
            match outcome {
                Outcome::Evaluated(verdict) => {
                    debug!(
                        instrument = %id,
                        emitted = verdict.emitted,
                        confidence = verdict.confidence,
                        "Instrument evaluated"
                    );
                    if verdict.emitted {
                        info!(
                            instrument = %id,
                            strength = %verdict.strength,
                            anchor_date = %verdict.anchor_date,
                            "Signal emitted"
                        );
                    }
                    status.record_verdict(verdict.emitted).await;
                    verdicts.push(verdict);
                }
                Outcome::Failed(reason) => {
                    warn!(instrument = %id, reason = %reason, "Instrument failed");
                    status.record_failure().await;
                    failures.insert(id, reason);
                }
                Outcome::Skipped => skipped += 1,
            }
        }

        verdicts.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
        let signalled = *cancel.borrow();
        let cancelled = skipped > 0 || signalled;
        status.finish(cancelled).await;

        let result = BatchResult {
            run_id,
            verdicts,
            failures,
            total_requested: ids.len(),
            cancelled,
        };
        info!(
            %run_id,
            succeeded = result.succeeded(),
            failed = result.failed(),
            emitted = result.emitted(),
            skipped,
            cancelled,
            "Batch finished"
        );
        result
    }
}

/// Drop repeated ids, keeping the first occurrence.
fn dedupe(instruments: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(instruments.len());
    for id in instruments {
        if seen.insert(id.as_str()) {
            ids.push(id.clone());
        } else {
            warn!(instrument = %id, "Duplicate instrument id ignored");
        }
    }
    ids
}
