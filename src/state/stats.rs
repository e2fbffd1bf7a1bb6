//! Loss, latency and jitter aggregation over probe samples.
//!
//! Jitter is the mean absolute difference between consecutive successful
//! samples. Timeouts and errors are dropped before pairing, so a success on
//! either side of a loss gap still forms a pair.

use serde::{Deserialize, Serialize};

use super::sample::{ProbeOutcome, ProbeSample};

/// Aggregated statistics over a slice of samples.
///
/// Latency fields are `None` when there is no successful sample; `jitter_ms`
/// is `None` until at least two successes exist.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: u64,
    pub success_count: u64,
    pub loss_count: u64,
    pub loss_pct: f64,
    pub min_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub jitter_ms: Option<f64>,
}

impl StatsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Running totals that produce a `StatsSnapshot`.
///
/// Used both by `aggregate` and as the whole-session accumulator, so the
/// session figures are bit-identical to aggregating every sample in order.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    count: u64,
    loss_count: u64,
    success_count: u64,
    latency_sum: f64,
    min_ms: Option<f64>,
    max_ms: Option<f64>,
    last_success_ms: Option<f64>,
    jitter_sum: f64,
    jitter_pairs: u64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.count += 1;

        let Some(latency) = outcome.latency_ms() else {
            self.loss_count += 1;
            return;
        };

        self.success_count += 1;
        self.latency_sum += latency;
        self.min_ms = Some(self.min_ms.map_or(latency, |m| m.min(latency)));
        self.max_ms = Some(self.max_ms.map_or(latency, |m| m.max(latency)));

        if let Some(last) = self.last_success_ms {
            self.jitter_sum += (latency - last).abs();
            self.jitter_pairs += 1;
        }
        self.last_success_ms = Some(latency);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let loss_pct = if self.count == 0 {
            0.0
        } else {
            self.loss_count as f64 / self.count as f64 * 100.0
        };
        let avg_ms = (self.success_count > 0).then(|| self.latency_sum / self.success_count as f64);
        let jitter_ms = (self.jitter_pairs > 0).then(|| self.jitter_sum / self.jitter_pairs as f64);

        StatsSnapshot {
            count: self.count,
            success_count: self.success_count,
            loss_count: self.loss_count,
            loss_pct,
            min_ms: self.min_ms,
            avg_ms,
            max_ms: self.max_ms,
            jitter_ms,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregate a sequence of samples, in order. Pure: equal input gives equal output.
pub fn aggregate<'a, I>(samples: I) -> StatsSnapshot
where
    I: IntoIterator<Item = &'a ProbeSample>,
{
    let mut acc = StatsAccumulator::new();
    for sample in samples {
        acc.record(&sample.outcome);
    }
    acc.snapshot()
}
